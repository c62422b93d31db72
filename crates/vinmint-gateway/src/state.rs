use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use vinmint_core::{SequenceError, SequenceStore};
use vinmint_issuer::BatchAllocator;

#[derive(Clone)]
pub struct AppState {
    allocator: BatchAllocator,
    allocation_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn SequenceStore>, allocation_timeout: Duration) -> Self {
        Self {
            allocator: BatchAllocator::new(store),
            allocation_timeout,
        }
    }

    pub fn allocator(&self) -> &BatchAllocator {
        &self.allocator
    }

    pub fn store(&self) -> &Arc<dyn SequenceStore> {
        self.allocator.store()
    }

    /// Budget for one whole batch request.
    pub fn allocation_timeout(&self) -> Duration {
        self.allocation_timeout
    }

    /// Runs a read-only store call, giving up after the same budget as a batch.
    pub async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, SequenceError>>,
    ) -> Result<T, SequenceError> {
        tokio::time::timeout(self.allocation_timeout, operation)
            .await
            .map_err(|_| {
                SequenceError::Timeout(format!(
                    "store did not answer within {} ms",
                    self.allocation_timeout.as_millis()
                ))
            })?
    }
}
