//! Key-value storage scopes backing sessions and fallback accounts.
//!
//! The web client kept two ad-hoc storage areas: one that outlives the
//! browsing session and one scoped to the current tab. Here both are an
//! injected abstraction: session persistence and the account store speak
//! [`KeyValueStorage`], and the caller picks the backends. File-backed
//! durable + in-memory transient in the CLI, in-memory fakes in tests.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::sync::Arc;

use thiserror::Error;

/// Storage lifetime scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Outlives the program, until explicitly cleared.
    Durable,
    /// Lives only as long as the current process.
    Transient,
}

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value storage. All operations are whole-value reads and
/// writes; backends serialize access internally.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// The durable and transient scopes, bundled for injection.
#[derive(Clone)]
pub struct ScopedStorage {
    durable: Arc<dyn KeyValueStorage>,
    transient: Arc<dyn KeyValueStorage>,
}

impl ScopedStorage {
    pub fn new(durable: Arc<dyn KeyValueStorage>, transient: Arc<dyn KeyValueStorage>) -> Self {
        Self { durable, transient }
    }

    /// Both scopes in memory: tests and ephemeral runs.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    pub fn scope(&self, scope: Scope) -> &dyn KeyValueStorage {
        match scope {
            Scope::Durable => self.durable.as_ref(),
            Scope::Transient => self.transient.as_ref(),
        }
    }

    /// Shared handle to the durable scope (the account store lives there
    /// alongside any remembered session).
    pub fn durable(&self) -> Arc<dyn KeyValueStorage> {
        Arc::clone(&self.durable)
    }
}
