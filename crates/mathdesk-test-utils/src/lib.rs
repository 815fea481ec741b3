//! Stand-in solvers for exercising the request handler without the calculator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use mathdesk_common::Solution;
use mathdesk_solver::{SolveError, Solver};

/// Answers every question with `{"echo": <question>}` and counts calls.
#[derive(Debug, Default)]
pub struct EchoSolver {
    calls: AtomicUsize,
}

impl EchoSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Solver for EchoSolver {
    fn solve(&self, question: &str) -> Result<Solution, SolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(echo_solution(question))
    }
}

/// The solution [`EchoSolver`] returns for `question`.
pub fn echo_solution(question: &str) -> Solution {
    Solution::solved(
        json!({ "echo": question }),
        vec![format!("echoed {}", question)],
        0.75,
    )
}

/// Always reports a parse failure.
#[derive(Debug, Default)]
pub struct FailingSolver;

impl Solver for FailingSolver {
    fn solve(&self, question: &str) -> Result<Solution, SolveError> {
        Err(SolveError::Parse(format!("cannot read '{}'", question)))
    }
}

/// Panics inside `solve`; the handler must survive it.
#[derive(Debug, Default)]
pub struct PanickingSolver;

impl Solver for PanickingSolver {
    fn solve(&self, question: &str) -> Result<Solution, SolveError> {
        panic!("solver blew up on {}", question)
    }
}

/// Sleeps before answering like [`EchoSolver`].
#[derive(Debug)]
pub struct SlowSolver {
    pub delay: Duration,
}

impl SlowSolver {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Solver for SlowSolver {
    fn solve(&self, question: &str) -> Result<Solution, SolveError> {
        std::thread::sleep(self.delay);
        Ok(echo_solution(question))
    }
}

/// Returns a solution with `result: null`.
#[derive(Debug, Default)]
pub struct UnsolvedSolver;

impl Solver for UnsolvedSolver {
    fn solve(&self, _question: &str) -> Result<Solution, SolveError> {
        Ok(Solution::unsolved(vec!["no answer found".to_string()]))
    }
}
