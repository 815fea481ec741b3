//! mathdesk-web: HTTP front-end for the math solver.
//! Provides:
//!   - POST /solve          solve a question and record it
//!   - GET  /history        every recorded question/solution pair
//!   - POST /clear_history  forget them all
//!   - GET  /               the browser UI

pub mod router;
pub mod handlers;
pub mod history;
pub mod state;
