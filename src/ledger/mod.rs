//! Expense and income records: the ledger store and its CRUD API.

pub mod dto;
pub mod handlers;
pub mod input;
pub mod query;
pub mod records;
pub mod repo;

pub use handlers::routes as router;
pub use records::{Expense, Income, LedgerEntry, UNCATEGORIZED};
