//! mathdesk-solver: the solving collaborator behind `POST /solve`.
//!
//! The request handler only knows the [`Solver`] trait. [`Calculator`] is the
//! built-in implementation: arithmetic, polynomial equations of degree two or
//! less in `x`, and a handful of geometry/number-theory commands.

pub mod calculator;
pub mod error;
pub mod expr;
pub mod linear;
pub mod normalise;
pub mod polynomial;

pub use calculator::Calculator;
pub use error::SolveError;

use mathdesk_common::Solution;

/// Turns a free-form problem string into a [`Solution`].
///
/// Implementations are called synchronously from a blocking worker thread and
/// have no built-in timeout.
pub trait Solver: Send + Sync {
    fn solve(&self, question: &str) -> Result<Solution, SolveError>;
}
