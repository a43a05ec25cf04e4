pub mod analytics;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod state;
