//! Sequence store backends.
//!
//! - [`FileSequenceStore`]: durable, single-instance only.
//! - [`RedisSequenceStore`]: atomic `INCR`, safe for many instances.
//! - [`InMemorySequenceStore`]: tests and local development.
//!
//! [`SelectorConfig`] picks between the file and Redis backends once per
//! process.

pub mod file;
pub mod headroom;
pub mod memory;
pub mod redis;
pub mod selector;

pub use file::FileSequenceStore;
pub use memory::InMemorySequenceStore;
pub use redis::RedisSequenceStore;
pub use selector::{SelectorConfig, DEFAULT_SEQUENCE_FILE};
pub use vinmint_core::sequence::Result;
pub use vinmint_core::{BackendKind, SequenceError, SequenceStats, SequenceStore};
