use crate::headroom::{audit_reset, check_headroom};
use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, info, trace, warn};
use vinmint_core::sequence::Result;
use vinmint_core::{BackendKind, Prefix, SequenceError, SequenceStats, SequenceStore};

/// Default namespace for counter keys.
pub const DEFAULT_KEY_PREFIX: &str = "vin:seq:";

/// A Redis-based implementation of [`SequenceStore`].
///
/// `allocate_next` is a single `INCR`, so uniqueness holds across any number
/// of independent processes sharing the same Redis. No client-side locking
/// is involved.
#[derive(Clone)]
pub struct RedisSequenceStore {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

impl std::fmt::Debug for RedisSequenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSequenceStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> SequenceError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        SequenceError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        SequenceError::Unavailable(message)
    } else {
        SequenceError::Operation(message)
    }
}

fn to_sequence(key: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        SequenceError::InvalidData(format!("counter '{key}' holds negative value {value}"))
    })
}

impl RedisSequenceStore {
    /// Creates a store on an existing connection with the default key prefix.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a store with a custom key prefix (e.g. `"plant-a:seq:"`).
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `url`.
    ///
    /// Fails with [`SequenceError::Unavailable`] when Redis cannot be reached.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            SequenceError::Unavailable(format!("invalid redis connection info: {e}"))
        })?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| SequenceError::Unavailable(format!("failed to connect to redis: {e}")))?;

        let store = Self::with_prefix(conn, key_prefix);
        info!(key_prefix = %store.key_prefix, "connected to redis sequence store");
        Ok(store)
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn counter_key(&self, prefix: &Prefix) -> String {
        format!("{}{}", self.key_prefix, prefix.as_str())
    }
}

#[async_trait]
impl SequenceStore for RedisSequenceStore {
    async fn allocate_next(&self, prefix: &Prefix) -> Result<u64> {
        let key = self.counter_key(prefix);
        trace!(prefix = %prefix, "incrementing redis counter");

        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(&key, 1).await.map_err(|e| {
            warn!(prefix = %prefix, error = %e, "redis INCR failed");
            map_redis_error("failed to increment counter", e)
        })?;
        let value = to_sequence(&key, value)?;

        debug!(prefix = %prefix, sequence = value, "allocated sequence from redis");
        check_headroom(BackendKind::Redis, prefix, value);
        Ok(value)
    }

    async fn read_current(&self, prefix: &Prefix) -> Result<u64> {
        let key = self.counter_key(prefix);

        let mut conn = self.conn.clone();
        let value: Option<i64> = conn.get(&key).await.map_err(|e| {
            warn!(prefix = %prefix, error = %e, "redis GET failed");
            map_redis_error("failed to read counter", e)
        })?;

        value.map_or(Ok(0), |v| to_sequence(&key, v))
    }

    async fn reset(&self, prefix: &Prefix, value: u64) -> Result<()> {
        let key = self.counter_key(prefix);
        let previous = self.read_current(prefix).await?;

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&key, value).await.map_err(|e| {
            warn!(prefix = %prefix, error = %e, "redis SET failed");
            map_redis_error("failed to reset counter", e)
        })?;

        audit_reset(BackendKind::Redis, prefix, previous, value);
        Ok(())
    }

    async fn statistics(&self) -> Result<SequenceStats> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.key_prefix);

        let keys: Vec<String> = conn
            .keys(&pattern)
            .await
            .map_err(|e| map_redis_error("failed to list counters", e))?;
        if keys.is_empty() {
            return Ok(SequenceStats::default());
        }

        let values: Vec<Option<i64>> = conn
            .mget(&keys)
            .await
            .map_err(|e| map_redis_error("failed to read counters", e))?;

        let mut counters = Vec::with_capacity(values.len());
        // keys may vanish between KEYS and MGET; those are skipped
        for (key, value) in keys.iter().zip(values) {
            if let Some(value) = value {
                counters.push(to_sequence(key, value)?);
            }
        }
        Ok(SequenceStats::from_counters(counters))
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Redis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    fn io_error(kind: ErrorKind, message: &str) -> redis::RedisError {
        redis::RedisError::from(Error::new(kind, message))
    }

    #[test]
    fn timed_out_io_maps_to_timeout() {
        let err = map_redis_error("INCR", io_error(ErrorKind::TimedOut, "deadline"));
        assert!(matches!(err, SequenceError::Timeout(_)));
    }

    #[test]
    fn refused_connection_maps_to_unavailable() {
        let err = map_redis_error("INCR", io_error(ErrorKind::ConnectionRefused, "refused"));
        assert!(matches!(err, SequenceError::Unavailable(_)));
    }

    #[test]
    fn message_text_does_not_decide_the_kind() {
        let err = map_redis_error("INCR", io_error(ErrorKind::Other, "upstream timed out"));
        assert!(matches!(err, SequenceError::Unavailable(_)));
    }
}
