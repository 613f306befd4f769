//! Durable key-value storage port.

use std::future::Future;

use thiserror::Error;

/// Errors from the durable key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying store could not be read or written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(String),

    /// Anything else the backend reports.
    #[error("storage error: {0}")]
    Backend(String),
}

/// Port for durable string storage.
///
/// `put` replaces the previous value in full: a concurrent `get` sees
/// either the old value or the new one, never a partial write. The file
/// adapter upholds this with a temp-write-then-rename.
pub trait StateStorage: Send + Sync {
    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the store itself is unreadable; a missing
    /// key is `Ok(None)`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Stores `value` under `key`, replacing any previous value in full.
    ///
    /// # Errors
    ///
    /// Returns an error when the value could not be written durably.
    fn put(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Removes the value stored under `key`. Deleting a missing key
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejected the deletion.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}
