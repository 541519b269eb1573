//! Row count fetching.
//!
//! [`RowCounter`] is the seam between the comparison engine and a database: the
//! sqlx-backed [`Database`] implements it, and so can anything else that can
//! answer "how many rows does this table have".

use crate::db::pool::Database;
use crate::error::{DbError, DbResult};
use crate::models::{Side, TableName};
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Something that can count the rows of a table.
pub trait RowCounter: Send + Sync + 'static {
    /// Human-readable identifier used in logs, errors, and the report header.
    fn name(&self) -> &str;

    /// Return the number of rows currently in `table`.
    fn count_rows(&self, table: &TableName) -> impl Future<Output = DbResult<u64>> + Send;
}

/// Build the scalar count statement for a validated table name.
///
/// The name is emitted unquoted so each server applies its usual identifier
/// folding (PostgreSQL lowercases `imx_table_A` to `imx_table_a`). Only names
/// accepted by [`TableName::parse`] can reach this point.
pub fn count_query(table: &TableName) -> String {
    format!("SELECT COUNT(*) FROM {}", table.as_str())
}

impl RowCounter for Database {
    fn name(&self) -> &str {
        Database::name(self)
    }

    async fn count_rows(&self, table: &TableName) -> DbResult<u64> {
        let sql = count_query(table);
        let database = Database::name(self);
        let table_name = table.as_str();

        let count = impl_db_dispatch!(self.pool(), {
            MySql(p) => count_rows_on!(p, &sql, database, table_name),
            Postgres(p) => count_rows_on!(p, &sql, database, table_name),
            SQLite(p) => count_rows_on!(p, &sql, database, table_name),
        })?;

        u64::try_from(count).map_err(|_| {
            DbError::internal(format!(
                "'{}' returned a negative row count ({}) for table '{}'",
                database, count, table_name
            ))
        })
    }
}

/// Fetch one side's row count for `table`.
///
/// The count races against `cancel`; a cancelled token yields
/// [`DbError::Cancelled`] and drops the in-flight query, returning its connection
/// to the pool.
pub async fn fetch_row_count<C: RowCounter>(
    counter: &C,
    table: &TableName,
    side: Side,
    cancel: &CancellationToken,
) -> DbResult<u64> {
    let start = Instant::now();

    let count = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DbError::cancelled(counter.name(), table.as_str())),
        result = counter.count_rows(table) => result,
    }?;

    debug!(
        database = %counter.name(),
        table = %table,
        side = %side,
        count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Fetched row count"
    );
    Ok(count)
}
