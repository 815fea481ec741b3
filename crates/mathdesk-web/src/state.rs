//! Shared application state for the web server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mathdesk_config::Config;
use mathdesk_solver::{Calculator, Solver};

use crate::history::HistoryStore;

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub solver: Arc<dyn Solver>,
    pub history: HistoryStore,
    /// Upper bound on a single solve; `None` waits as long as the solver takes.
    pub solve_timeout: Option<Duration>,
    /// Directory served under /static.
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(solver: Arc<dyn Solver>) -> Self {
        Self {
            solver,
            history: HistoryStore::new(),
            solve_timeout: None,
            static_dir: bundled_static_dir(),
        }
    }

    /// State for the built-in calculator, shaped by `config`.
    pub fn from_config(config: &Config) -> Self {
        let history = match config.history.max_entries {
            Some(max) => HistoryStore::bounded(max),
            None => HistoryStore::new(),
        };

        let mut state = Self::new(Arc::new(Calculator::new()))
            .with_history(history)
            .with_solve_timeout(config.solver.timeout());
        if let Some(dir) = &config.web.static_dir {
            state = state.with_static_dir(dir.clone());
        }
        state
    }

    pub fn with_history(mut self, history: HistoryStore) -> Self {
        self.history = history;
        self
    }

    pub fn with_solve_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.solve_timeout = timeout;
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }
}

pub type SharedState = Arc<AppState>;

fn bundled_static_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}
