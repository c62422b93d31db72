use crate::headroom::{audit_reset, check_headroom};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;
use vinmint_core::sequence::Result;
use vinmint_core::{BackendKind, Prefix, SequenceError, SequenceStats, SequenceStore};

/// In-memory implementation of [`SequenceStore`] using DashMap.
///
/// Increments happen while holding the shard's entry lock, so concurrent
/// allocations for one prefix behave like a remote atomic `INCR`. Counters
/// are lost when the process exits; use it for tests and local development.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    counters: DashMap<Prefix, u64>,
}

impl InMemorySequenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceStore for InMemorySequenceStore {
    async fn allocate_next(&self, prefix: &Prefix) -> Result<u64> {
        let value = {
            let mut counter = self.counters.entry(prefix.clone()).or_insert(0);
            *counter = counter.checked_add(1).ok_or_else(|| {
                SequenceError::Operation(format!("counter overflow for prefix {prefix}"))
            })?;
            *counter
        };
        trace!(prefix = %prefix, sequence = value, "allocated sequence in memory");
        check_headroom(BackendKind::InMemory, prefix, value);
        Ok(value)
    }

    async fn read_current(&self, prefix: &Prefix) -> Result<u64> {
        Ok(self.counters.get(prefix).map(|v| *v).unwrap_or(0))
    }

    async fn reset(&self, prefix: &Prefix, value: u64) -> Result<()> {
        let previous = self.counters.insert(prefix.clone(), value).unwrap_or(0);
        audit_reset(BackendKind::InMemory, prefix, previous, value);
        Ok(())
    }

    async fn statistics(&self) -> Result<SequenceStats> {
        Ok(SequenceStats::from_counters(
            self.counters.iter().map(|entry| *entry.value()),
        ))
    }

    fn backend(&self) -> BackendKind {
        BackendKind::InMemory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn prefix(s: &str) -> Prefix {
        Prefix::new(s).unwrap()
    }

    #[tokio::test]
    async fn sequential_allocations_have_no_gaps() {
        let store = InMemorySequenceStore::new();
        let p = prefix("LZSHCKZSWS");

        for expected in 1..=50 {
            assert_eq!(store.allocate_next(&p).await.unwrap(), expected);
        }
        assert_eq!(store.read_current(&p).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn prefixes_are_independent() {
        let store = InMemorySequenceStore::new();
        let a = prefix("LZSHCKZSWS");
        let b = prefix("LZSHCKZSW1");

        store.allocate_next(&a).await.unwrap();
        store.allocate_next(&a).await.unwrap();
        assert_eq!(store.allocate_next(&b).await.unwrap(), 1);
        assert_eq!(store.read_current(&a).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn read_current_does_not_increment() {
        let store = InMemorySequenceStore::new();
        let p = prefix("LZSHCKZSWS");

        assert_eq!(store.read_current(&p).await.unwrap(), 0);
        assert_eq!(store.read_current(&p).await.unwrap(), 0);
        assert_eq!(store.allocate_next(&p).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reset_then_reallocate() {
        let store = InMemorySequenceStore::new();
        let p = prefix("LZSHCKZSWS");

        store.allocate_next(&p).await.unwrap();
        store.reset(&p, 100).await.unwrap();
        assert_eq!(store.allocate_next(&p).await.unwrap(), 101);
    }

    #[tokio::test]
    async fn allocation_past_serial_limit_does_not_fail() {
        let store = InMemorySequenceStore::new();
        let p = prefix("LZSHCKZSWS");

        store.reset(&p, 999_999).await.unwrap();
        assert_eq!(store.allocate_next(&p).await.unwrap(), 1_000_000);
    }

    #[tokio::test]
    async fn statistics_aggregate_all_prefixes() {
        let store = InMemorySequenceStore::new();
        store.reset(&prefix("LZSHCKZSWS"), 10).await.unwrap();
        store.reset(&prefix("LZSHCKZSW1"), 30).await.unwrap();

        let stats = store.statistics().await.unwrap();
        assert_eq!(stats.total_prefixes, 2);
        assert_eq!(stats.total_issued, 40);
        assert_eq!(stats.max_sequence, 30);
        assert!((stats.average_sequence - 20.0).abs() < f64::EPSILON);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_never_share_a_value() {
        const CALLERS: u64 = 16;
        const PER_CALLER: u64 = 250;

        let store = Arc::new(InMemorySequenceStore::new());
        let p = prefix("LZSHCKZSWS");

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let store = Arc::clone(&store);
                let p = p.clone();
                tokio::spawn(async move {
                    let mut seen = Vec::with_capacity(PER_CALLER as usize);
                    for _ in 0..PER_CALLER {
                        seen.push(store.allocate_next(&p).await.unwrap());
                    }
                    seen
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            let values = handle.await.unwrap();
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            for value in values {
                assert!(all.insert(value), "duplicate sequence {value}");
            }
        }

        let expected: HashSet<u64> = (1..=CALLERS * PER_CALLER).collect();
        assert_eq!(all, expected);
    }
}
