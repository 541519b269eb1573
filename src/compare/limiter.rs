//! Admission gate bounding how many tables are compared at once.

use crate::error::{DbError, DbResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

/// Capacity-bounded gate in front of the table comparators.
///
/// At most `capacity` [`LimiterPermit`]s exist at any instant. No fairness is
/// promised between waiters.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    contended: AtomicUsize,
}

/// A held slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots. A capacity of 0 would block every
    /// comparison forever and is rejected.
    pub fn new(capacity: usize) -> DbResult<Self> {
        if capacity == 0 {
            return Err(DbError::invalid_input(
                "Concurrency limit must be at least 1",
            ));
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(DbError::invalid_input(format!(
                "Concurrency limit {} exceeds the maximum of {}",
                capacity,
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            contended: AtomicUsize::new(0),
        })
    }

    /// Wait until a slot is free and reserve it.
    pub async fn acquire(&self) -> DbResult<LimiterPermit> {
        let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                debug!(capacity = self.capacity, "Waiting for a comparison slot");
                Arc::clone(&self.semaphore)
                    .acquire_owned()
                    .await
                    .map_err(|_| DbError::internal("Concurrency limiter closed"))?
            }
            Err(TryAcquireError::Closed) => {
                return Err(DbError::internal("Concurrency limiter closed"));
            }
        };
        Ok(LimiterPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// How many acquisitions found every slot taken and had to wait.
    pub fn contended_acquisitions(&self) -> usize {
        self.contended.load(Ordering::Relaxed)
    }
}
