//! Aggregate summaries and chart series over a user's ledger.

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub use handlers::routes as router;
