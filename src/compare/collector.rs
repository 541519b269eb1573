//! Result stream between the comparator tasks and the collector.

use crate::error::{DbError, DbResult};
use crate::models::TableDiff;
use tokio::sync::mpsc;
use tracing::debug;

/// Sending half handed to each comparator task.
#[derive(Debug, Clone)]
pub struct ResultSender {
    tx: mpsc::Sender<TableDiff>,
}

/// Receiving half owned by the [`Collector`].
#[derive(Debug)]
pub struct ResultReceiver {
    rx: mpsc::Receiver<TableDiff>,
}

/// Create a result stream holding up to `capacity` records.
///
/// Sized to the table count, a send never waits for the reader.
pub fn result_stream(capacity: usize) -> (ResultSender, ResultReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ResultSender { tx }, ResultReceiver { rx })
}

impl ResultSender {
    /// Publish a completed record.
    pub async fn publish(&self, diff: TableDiff) -> DbResult<()> {
        let table = diff.name.clone();
        self.tx.send(diff).await.map_err(|_| {
            DbError::internal(format!(
                "Result collector stopped before table '{}' was published",
                table
            ))
        })
    }
}

/// Drains the result stream in completion order.
#[derive(Debug)]
pub struct Collector {
    receiver: ResultReceiver,
    expected: usize,
}

impl Collector {
    pub fn new(receiver: ResultReceiver, expected: usize) -> Self {
        Self { receiver, expected }
    }

    /// Receive records until `expected` have arrived or every sender is gone.
    ///
    /// There is no timeout. The caller decides whether a short result is an error.
    pub async fn collect(mut self) -> Vec<TableDiff> {
        let mut diffs = Vec::with_capacity(self.expected);
        while diffs.len() < self.expected {
            match self.receiver.rx.recv().await {
                Some(diff) => {
                    debug!(
                        table = %diff.name,
                        received = diffs.len() + 1,
                        expected = self.expected,
                        "Collected table diff"
                    );
                    diffs.push(diff);
                }
                None => break,
            }
        }
        diffs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableName;

    fn diff(name: &str, source: u64, dest: u64) -> TableDiff {
        TableDiff::new(TableName::parse(name).unwrap(), source, dest)
    }

    #[tokio::test]
    async fn test_collects_in_completion_order() {
        let (tx, rx) = result_stream(3);
        tx.publish(diff("c", 1, 1)).await.unwrap();
        tx.publish(diff("a", 2, 2)).await.unwrap();
        tx.publish(diff("b", 3, 3)).await.unwrap();

        let diffs = Collector::new(rx, 3).collect().await;
        let names: Vec<&str> = diffs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_stops_at_expected() {
        let (tx, rx) = result_stream(3);
        tx.publish(diff("a", 1, 1)).await.unwrap();
        tx.publish(diff("b", 1, 1)).await.unwrap();
        tx.publish(diff("c", 1, 1)).await.unwrap();

        // Sender is still alive, so returning proves the count bound ended the loop.
        let diffs = Collector::new(rx, 2).collect().await;
        assert_eq!(diffs.len(), 2);
        drop(tx);
    }

    #[tokio::test]
    async fn test_returns_short_when_senders_dropped() {
        let (tx, rx) = result_stream(3);
        tx.publish(diff("a", 1, 1)).await.unwrap();
        drop(tx);

        let diffs = Collector::new(rx, 3).collect().await;
        assert_eq!(diffs.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_fails_after_collector_dropped() {
        let (tx, rx) = result_stream(1);
        drop(rx);
        let err = tx.publish(diff("a", 1, 1)).await.unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }
}
