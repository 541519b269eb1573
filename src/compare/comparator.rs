//! Per-table comparison: both counts fetched concurrently, joined into one record.

use crate::db::{RowCounter, fetch_row_count};
use crate::error::{DbError, DbResult};
use crate::models::{Side, TableDiff, TableList, TableName};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Compares one table at a time across the source and destination databases.
#[derive(Debug)]
pub struct TableComparator<C: RowCounter> {
    source: Arc<C>,
    destination: Arc<C>,
    allowed: Arc<TableList>,
    cancel: CancellationToken,
}

impl<C: RowCounter> Clone for TableComparator<C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            destination: Arc::clone(&self.destination),
            allowed: Arc::clone(&self.allowed),
            cancel: self.cancel.clone(),
        }
    }
}

impl<C: RowCounter> TableComparator<C> {
    /// `allowed` is the configured table list; `compare` refuses anything outside it.
    pub fn new(
        source: Arc<C>,
        destination: Arc<C>,
        allowed: Arc<TableList>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            destination,
            allowed,
            cancel,
        }
    }

    /// Fetch both row counts for `table` and join them.
    ///
    /// Either side may finish first. If either fails, the other fetch is dropped
    /// and the error is returned without producing a record.
    pub async fn compare(&self, table: &TableName) -> DbResult<TableDiff> {
        if !self.allowed.contains(table) {
            return Err(DbError::invalid_input(format!(
                "Table '{}' is not in the configured table list",
                table
            )));
        }

        let start = Instant::now();
        let (source_row_count, dest_row_count) = tokio::try_join!(
            fetch_row_count(&*self.source, table, Side::Source, &self.cancel),
            fetch_row_count(&*self.destination, table, Side::Destination, &self.cancel),
        )?;

        info!(
            table = %table,
            source_count = source_row_count,
            dest_count = dest_row_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieved row counts"
        );

        Ok(TableDiff::new(table.clone(), source_row_count, dest_row_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedCounter {
        name: &'static str,
        counts: HashMap<&'static str, u64>,
    }

    impl RowCounter for FixedCounter {
        fn name(&self) -> &str {
            self.name
        }

        async fn count_rows(&self, table: &TableName) -> DbResult<u64> {
            self.counts.get(table.as_str()).copied().ok_or_else(|| {
                DbError::query_execution(self.name, table.as_str(), "no such table", None)
            })
        }
    }

    fn comparator(tables: &[&str]) -> TableComparator<FixedCounter> {
        let source = FixedCounter {
            name: "src",
            counts: HashMap::from([("A", 10), ("B", 5)]),
        };
        let destination = FixedCounter {
            name: "dst",
            counts: HashMap::from([("A", 10), ("B", 7)]),
        };
        TableComparator::new(
            Arc::new(source),
            Arc::new(destination),
            Arc::new(TableList::parse(tables).unwrap()),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_compare_joins_both_sides() {
        let comparator = comparator(&["A", "B"]);
        let diff = comparator
            .compare(&TableName::parse("B").unwrap())
            .await
            .unwrap();
        assert_eq!(diff.source_row_count, 5);
        assert_eq!(diff.dest_row_count, 7);
        assert_eq!(diff.diff(), -2);
    }

    #[tokio::test]
    async fn test_compare_rejects_unlisted_table() {
        let comparator = comparator(&["A"]);
        let err = comparator
            .compare(&TableName::parse("B").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_compare_propagates_side_failure() {
        let comparator = comparator(&["A", "C"]);
        let err = comparator
            .compare(&TableName::parse("C").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryExecution { .. }));
        assert_eq!(err.table(), Some("C"));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_comparison() {
        let comparator = comparator(&["A"]);
        comparator.cancel.cancel();
        let err = comparator
            .compare(&TableName::parse("A").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Cancelled { .. }));
    }
}
