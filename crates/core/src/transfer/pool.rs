//! Bounded-concurrency execution of transfer units
//!
//! A counting semaphore gates admission: once `capacity` units are in
//! flight, the submission loop blocks until one finishes. Completed units
//! report immediately; results arrive in completion order, so each unit
//! carries its own identity (part number, path) in its output.
//!
//! The pool neither retries nor cancels. Retry happens inside the unit via
//! [`crate::retry::with_backoff`]; an admitted unit always runs to a
//! terminal outcome.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Admission-gated worker pool
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity.max(1))),
        }
    }

    /// Run every unit to completion and collect the outcomes in completion
    /// order.
    pub async fn run_all<T, Fut>(&self, units: impl IntoIterator<Item = Fut>) -> Vec<T>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut set = JoinSet::new();
        for unit in units {
            // Blocks once `capacity` permits are out; the permit is released
            // when the spawned task drops it on completion.
            let permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .expect("transfer semaphore is never closed");
            set.spawn(async move {
                let _permit = permit;
                unit.await
            });
        }

        let mut results = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => results.push(outcome),
                Err(err) => tracing::error!("transfer unit panicked: {err}"),
            }
        }
        results
    }
}
