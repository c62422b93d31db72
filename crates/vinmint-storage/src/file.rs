use crate::headroom::{audit_reset, check_headroom};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, trace};
use vinmint_core::sequence::Result;
use vinmint_core::{BackendKind, Prefix, SequenceError, SequenceStats, SequenceStore};

/// Counter document as stored on disk: prefix -> last issued value.
type Counters = BTreeMap<String, u64>;

#[derive(Debug, Default)]
struct State {
    loaded: bool,
    counters: Counters,
}

/// Durable single-writer implementation of [`SequenceStore`].
///
/// Counters live in one JSON document. Every read-modify-write cycle runs
/// under a store-wide mutex, and a new value only becomes visible in memory
/// after it has been written to a temp file, synced and renamed over the
/// document. A value returned to a caller is therefore always on disk.
///
/// Writes run on a detached task that owns the lock until the flush is done.
/// A caller that stops waiting (e.g. on a deadline) skips the value but
/// never leaves a half-finished write behind for the next caller.
///
/// There is no cross-process locking: run exactly one instance per file.
#[derive(Debug)]
pub struct FileSequenceStore {
    path: PathBuf,
    state: Arc<Mutex<State>>,
}

impl FileSequenceStore {
    /// Creates a store backed by `path`. The file is read on first access and
    /// created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Returns the path of the counter document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `update` to a copy of the counters, persists the copy and only
    /// then makes it the cached state.
    async fn write_through<T, F>(&self, update: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Counters) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let mut state = lock_loaded(state, &path).await?;
            let mut counters = state.counters.clone();
            let output = update(&mut counters)?;
            persist(&path, &counters).await?;
            state.counters = counters;
            Ok::<_, SequenceError>(output)
        })
        .await
        .map_err(|e| SequenceError::Operation(format!("counter update task failed: {e}")))?
    }
}

/// Locks the store, loading the document if this is the first access.
async fn lock_loaded(state: Arc<Mutex<State>>, path: &Path) -> Result<OwnedMutexGuard<State>> {
    let mut state = state.lock_owned().await;
    if !state.loaded {
        state.counters = load(path).await?;
        state.loaded = true;
        info!(
            path = %path.display(),
            prefixes = state.counters.len(),
            "loaded sequence counters"
        );
    }
    Ok(state)
}

async fn load(path: &Path) -> Result<Counters> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no sequence file, starting fresh");
            return Ok(Counters::new());
        }
        Err(e) => {
            return Err(SequenceError::Unavailable(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    serde_json::from_str(&content).map_err(|e| {
        SequenceError::InvalidData(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Writes the document atomically: temp file, fsync, rename.
async fn persist(path: &Path, counters: &Counters) -> Result<()> {
    let persist_error =
        |action: &str, target: &Path, e: std::io::Error| -> SequenceError {
            SequenceError::Persist(format!("failed to {action} {}: {e}", target.display()))
        };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| persist_error("create directory", parent, e))?;
    }

    let content = serde_json::to_vec_pretty(counters)
        .map_err(|e| SequenceError::Persist(format!("failed to serialize counters: {e}")))?;

    let tmp_path = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| persist_error("create", &tmp_path, e))?;
    file.write_all(&content)
        .await
        .map_err(|e| persist_error("write", &tmp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| persist_error("sync", &tmp_path, e))?;
    drop(file);

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| persist_error("replace", path, e))?;

    trace!(path = %path.display(), prefixes = counters.len(), "persisted sequence counters");
    Ok(())
}

#[async_trait]
impl SequenceStore for FileSequenceStore {
    async fn allocate_next(&self, prefix: &Prefix) -> Result<u64> {
        let key = prefix.to_string();
        let next = self
            .write_through(move |counters| {
                let current = counters.get(&key).copied().unwrap_or(0);
                let next = current.checked_add(1).ok_or_else(|| {
                    SequenceError::Operation(format!("counter overflow for prefix {key}"))
                })?;
                counters.insert(key, next);
                Ok(next)
            })
            .await?;

        trace!(prefix = %prefix, sequence = next, "allocated sequence from file store");
        check_headroom(BackendKind::LocalFile, prefix, next);
        Ok(next)
    }

    async fn read_current(&self, prefix: &Prefix) -> Result<u64> {
        let state = lock_loaded(Arc::clone(&self.state), &self.path).await?;
        Ok(state.counters.get(prefix.as_str()).copied().unwrap_or(0))
    }

    async fn reset(&self, prefix: &Prefix, value: u64) -> Result<()> {
        let key = prefix.to_string();
        let previous = self
            .write_through(move |counters| Ok(counters.insert(key, value).unwrap_or(0)))
            .await?;

        audit_reset(BackendKind::LocalFile, prefix, previous, value);
        Ok(())
    }

    async fn statistics(&self) -> Result<SequenceStats> {
        let state = lock_loaded(Arc::clone(&self.state), &self.path).await?;
        Ok(SequenceStats::from_counters(
            state.counters.values().copied(),
        ))
    }

    fn backend(&self) -> BackendKind {
        BackendKind::LocalFile
    }
}
