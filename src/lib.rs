//! Table Count Diff Library
//!
//! Compares per-table row counts between a source and a destination database
//! (SQLite, PostgreSQL, MySQL) with a bounded number of comparisons in flight.

pub mod compare;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod report;

pub use compare::{FailurePolicy, Orchestrator};
pub use config::Config;
pub use db::{Database, RowCounter};
pub use error::{DbError, DbResult};
pub use report::{Report, ReportFormat};
