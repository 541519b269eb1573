//! Database access layer.
//!
//! This module provides:
//! - Connection pool construction per database type
//! - The row count fetcher and the `RowCounter` seam used by the comparator
//! - Database dispatch macros for reducing code duplication

#[macro_use]
pub mod macros;
pub mod counter;
pub mod pool;

pub use counter::{RowCounter, count_query, fetch_row_count};
pub use pool::{Database, DbPool};
