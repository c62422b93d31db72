use crate::file::FileSequenceStore;
use crate::redis::{RedisSequenceStore, DEFAULT_KEY_PREFIX};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use typed_builder::TypedBuilder;
use vinmint_core::sequence::Result;
use vinmint_core::{BackendKind, SequenceStore};

/// Default location of the local counter document.
pub const DEFAULT_SEQUENCE_FILE: &str = "data/vin-sequences.json";

/// Inputs to the one-time backend decision.
///
/// # Example
///
/// ```rust
/// use vinmint_storage::SelectorConfig;
///
/// let config = SelectorConfig::builder()
///     .redis_url(Some("redis://127.0.0.1:6379".to_string()))
///     .build();
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SelectorConfig {
    /// Connection URL (with credentials) for the distributed backend.
    #[builder(default)]
    pub redis_url: Option<String>,

    /// Counter document used when no Redis URL is configured.
    #[builder(default = PathBuf::from(DEFAULT_SEQUENCE_FILE), setter(into))]
    pub sequence_file: PathBuf,

    /// Key namespace inside Redis.
    #[builder(default = DEFAULT_KEY_PREFIX.to_string(), setter(into))]
    pub redis_key_prefix: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SelectorConfig {
    /// Decides which backend to use. Redis wins whenever a non-blank URL is set.
    pub fn choose(&self) -> BackendKind {
        match self.redis_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => BackendKind::Redis,
            _ => BackendKind::LocalFile,
        }
    }

    /// Builds the chosen store. Call once per process and share the result.
    ///
    /// If Redis is configured but unreachable this fails with
    /// [`vinmint_core::SequenceError::Unavailable`]; it never falls back to the
    /// local file, since mixing backends for one prefix can issue duplicates.
    pub async fn select(&self) -> Result<Arc<dyn SequenceStore>> {
        match (self.choose(), self.redis_url.as_deref()) {
            (BackendKind::Redis, Some(url)) => {
                let store = RedisSequenceStore::connect(url.trim(), &*self.redis_key_prefix).await?;
                info!(
                    backend = %BackendKind::Redis,
                    key_prefix = %self.redis_key_prefix,
                    "selected sequence backend"
                );
                Ok(Arc::new(store))
            }
            _ => {
                warn!(
                    backend = %BackendKind::LocalFile,
                    path = %self.sequence_file.display(),
                    "selected sequence backend; uniqueness holds only while a single instance runs"
                );
                Ok(Arc::new(FileSequenceStore::new(self.sequence_file.clone())))
            }
        }
    }
}
