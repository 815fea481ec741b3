//! mathdesk-common: shared types and errors used across all mathdesk crates.

pub mod error;
pub mod model;

// Re-export commonly used types
pub use error::{ApiError, ErrorKind};
pub use model::{HistoryEntry, Query, Solution};
