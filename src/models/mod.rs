//! Data models for table-count-diff.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod table;

// Re-export commonly used types
pub use connection::{DatabaseType, mask_connection_string};
pub use table::{ComparisonOutcome, Side, TableDiff, TableFailure, TableList, TableName};
