//! HTTP handlers for all web routes.

pub mod history;
pub mod page;
pub mod solve;
