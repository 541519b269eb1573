//! Fan-out of table comparisons under the concurrency limiter, fan-in through the
//! result stream.

use crate::compare::collector::{Collector, ResultSender, result_stream};
use crate::compare::comparator::TableComparator;
use crate::compare::limiter::ConcurrencyLimiter;
use crate::db::RowCounter;
use crate::error::{DbError, DbResult};
use crate::models::{ComparisonOutcome, TableDiff, TableFailure, TableList, TableName};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// What the orchestrator does when a table comparison fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort every remaining comparison and return the first error.
    #[default]
    FailFast,
    /// Record the failure and keep comparing the other tables.
    ContinueOnError,
}

type TaskOutput = (TableName, DbResult<()>);

/// Runs one [`TableComparator`] per configured table, at most `capacity` at a time.
#[derive(Debug)]
pub struct Orchestrator<C: RowCounter> {
    tables: Arc<TableList>,
    comparator: TableComparator<C>,
    limiter: Arc<ConcurrencyLimiter>,
    policy: FailurePolicy,
}

impl<C: RowCounter> Orchestrator<C> {
    pub fn new(
        tables: TableList,
        source: Arc<C>,
        destination: Arc<C>,
        capacity: usize,
    ) -> DbResult<Self> {
        let limiter = Arc::new(ConcurrencyLimiter::new(capacity)?);
        let tables = Arc::new(tables);
        // Nothing cancels this token yet; it is threaded through every fetch.
        let comparator = TableComparator::new(
            source,
            destination,
            Arc::clone(&tables),
            CancellationToken::new(),
        );

        Ok(Self {
            tables,
            comparator,
            limiter,
            policy: FailurePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Compare every configured table and collect the results in completion order.
    pub async fn run(&self) -> DbResult<ComparisonOutcome> {
        let expected = self.tables.len();
        let start = Instant::now();
        info!(
            tables = expected,
            capacity = self.limiter.capacity(),
            policy = ?self.policy,
            "Starting comparison"
        );

        let (sender, receiver) = result_stream(expected);
        let tasks = self.dispatch(sender);
        let collector = Collector::new(receiver, expected);

        let (failures, diffs) = tokio::try_join!(self.supervise(tasks), async {
            Ok::<_, DbError>(collector.collect().await)
        })?;

        let outcome = assemble_outcome(expected, diffs, failures)?;
        info!(
            compared = outcome.diffs.len(),
            failed = outcome.failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Comparison finished"
        );
        Ok(outcome)
    }

    /// Spawn one gated comparison task per table.
    fn dispatch(&self, sender: ResultSender) -> JoinSet<TaskOutput> {
        let mut tasks = JoinSet::new();
        for table in self.tables.iter() {
            let table = table.clone();
            let comparator = self.comparator.clone();
            let limiter = Arc::clone(&self.limiter);
            let sender = sender.clone();
            tasks.spawn(async move {
                let result = compare_table(&comparator, &limiter, &sender, &table).await;
                (table, result)
            });
        }
        tasks
    }

    /// Wait for every task, applying the failure policy as results come in.
    async fn supervise(&self, mut tasks: JoinSet<TaskOutput>) -> DbResult<Vec<TableFailure>> {
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((table, Err(err))) => match self.policy {
                    FailurePolicy::FailFast => {
                        error!(table = %table, error = %err, "Comparison failed, aborting run");
                        tasks.abort_all();
                        return Err(err);
                    }
                    FailurePolicy::ContinueOnError => {
                        warn!(table = %table, error = %err, "Comparison failed, continuing");
                        failures.push(TableFailure {
                            table,
                            error: err.to_string(),
                        });
                    }
                },
                Err(join_err) => {
                    error!(error = %join_err, "Comparison task crashed, aborting run");
                    tasks.abort_all();
                    return Err(DbError::internal(format!(
                        "Comparison task crashed: {}",
                        join_err
                    )));
                }
            }
        }

        Ok(failures)
    }
}

/// Every table must end up either compared or recorded as failed.
fn assemble_outcome(
    expected: usize,
    diffs: Vec<TableDiff>,
    failures: Vec<TableFailure>,
) -> DbResult<ComparisonOutcome> {
    let received = diffs.len() + failures.len();
    if received != expected {
        return Err(DbError::incomplete(expected, received));
    }
    Ok(ComparisonOutcome { diffs, failures })
}

/// Body of one comparison task. The slot is held until the record is published.
async fn compare_table<C: RowCounter>(
    comparator: &TableComparator<C>,
    limiter: &ConcurrencyLimiter,
    sender: &ResultSender,
    table: &TableName,
) -> DbResult<()> {
    let _permit = limiter.acquire().await?;
    let diff = comparator.compare(table).await?;
    sender.publish(diff).await
}
