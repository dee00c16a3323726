//! # Key-Value Store Port
//!
//! The only contract the publisher has with the external store. Production
//! deployments use the Consul HTTP client from `beacon-consul`; tests and
//! dry runs use [`MemoryKvStore`].
//!
//! The port is synchronous. A post-process call blocks inside `put` until the
//! store answers; no retry or timeout policy is layered on top.

use std::collections::BTreeMap;

use parking_lot::Mutex;

/// Errors from store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Transport failure: connection refused, TLS, reset.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The store answered with a non-success status.
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The store answered but declined the write.
    #[error("store rejected write of {key}")]
    Rejected { key: String },

    /// The key cannot be addressed on this store.
    #[error("invalid store key {key}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// No async runtime to drive the request on.
    #[error("store runtime unavailable: {reason}")]
    Runtime { reason: String },
}

/// Store client construction failed. The owning post-processor cannot run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to connect to store at {address}: {reason}")]
pub struct ConnectError {
    pub address: String,
    pub reason: String,
}

/// Adapter trait for the external key-value store.
///
/// Implementations must be `Send + Sync` so one client can be shared behind
/// an `Arc`. Sequential use is all the post-processor needs.
pub trait KvStore: Send + Sync {
    /// Write `value` at `key`, replacing any existing value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Read the value at `key`. `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Human-readable name for progress output (e.g. "Consul at 10.0.0.1:8500").
    fn store_name(&self) -> &str;
}

impl<S: KvStore + ?Sized> KvStore for std::sync::Arc<S> {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn store_name(&self) -> &str {
        (**self).store_name()
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    puts: Mutex<Vec<String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored entries.
    pub fn entries(&self) -> BTreeMap<String, Vec<u8>> {
        self.entries.lock().clone()
    }

    /// Every key written, in write order, including overwrites.
    pub fn put_log(&self) -> Vec<String> {
        self.puts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KvStore for MemoryKvStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        self.puts.lock().push(key.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn store_name(&self) -> &str {
        "in-memory store"
    }
}
