use crate::error::SequenceError;
use crate::vin::Prefix;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Result type for sequence store operations.
pub type Result<T> = std::result::Result<T, SequenceError>;

/// Which backend a [`SequenceStore`] persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Process-local memory. Lost on restart.
    InMemory,
    /// A single file on local disk. Correct only with one running instance.
    LocalFile,
    /// A remote store with a native atomic increment.
    Redis,
}

impl BackendKind {
    /// Returns `true` if uniqueness holds across independent processes.
    pub fn is_multi_instance_safe(&self) -> bool {
        matches!(self, BackendKind::Redis)
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::InMemory => write!(f, "in-memory"),
            BackendKind::LocalFile => write!(f, "local-file"),
            BackendKind::Redis => write!(f, "redis"),
        }
    }
}

/// Aggregate view over every counter a store knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceStats {
    pub total_prefixes: u64,
    /// Sum of all counters, i.e. the number of sequence numbers handed out.
    pub total_issued: u64,
    pub max_sequence: u64,
    pub average_sequence: f64,
}

impl SequenceStats {
    /// Builds statistics from the current value of each counter.
    pub fn from_counters(counters: impl IntoIterator<Item = u64>) -> Self {
        let mut stats = Self::default();
        for value in counters {
            stats.total_prefixes += 1;
            stats.total_issued = stats.total_issued.saturating_add(value);
            stats.max_sequence = stats.max_sequence.max(value);
        }
        if stats.total_prefixes > 0 {
            stats.average_sequence = stats.total_issued as f64 / stats.total_prefixes as f64;
        }
        stats
    }
}

/// Per-prefix monotonic counters.
///
/// Counters start at 0 and are created by the first allocation. All counter
/// mutation goes through this trait.
#[async_trait]
pub trait SequenceStore: Send + Sync + 'static {
    /// Atomically increments the counter for `prefix` and returns the new value.
    ///
    /// Two calls for the same prefix never return the same value. An error
    /// must never be treated as an implicit 0.
    async fn allocate_next(&self, prefix: &Prefix) -> Result<u64>;

    /// Returns the last persisted value, or 0 if `prefix` was never allocated.
    async fn read_current(&self, prefix: &Prefix) -> Result<u64>;

    /// Force-sets the counter for `prefix`.
    ///
    /// Lowering a counter re-issues sequence numbers that may already be in
    /// use. Implementations log every reset as a warning.
    async fn reset(&self, prefix: &Prefix, value: u64) -> Result<()>;

    /// Read-only aggregate over all known prefixes.
    async fn statistics(&self) -> Result<SequenceStats>;

    /// The backend this store persists to.
    fn backend(&self) -> BackendKind;
}
