//! Bounded-concurrency table comparison.
//!
//! - `limiter`: admission gate capping concurrent comparisons
//! - `comparator`: joins the two row counts of one table
//! - `collector`: result stream and its completion-order drain
//! - `orchestrator`: fans comparisons out and applies the failure policy

pub mod collector;
pub mod comparator;
pub mod limiter;
pub mod orchestrator;

pub use collector::{Collector, ResultReceiver, ResultSender, result_stream};
pub use comparator::TableComparator;
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use orchestrator::{FailurePolicy, Orchestrator};
