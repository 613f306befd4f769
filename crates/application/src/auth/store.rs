//! Persisted auth-state store.

use beacon_domain::AuthState;
use tokio::sync::Mutex;
use tracing::warn;

use crate::ports::{StateStorage, StorageError};

/// Storage key under which the serialized state lives.
const STATE_KEY: &str = "auth_state";

/// Thread-safe load/save of the serialized [`AuthState`].
///
/// `load` never fails: missing, corrupt or unreadable storage yields the
/// empty state with a logged warning, so the process starts
/// unauthenticated instead of crashing. Writes serialize behind a mutex
/// spanning the whole save, so concurrent saves cannot interleave.
pub struct AuthStateStore<S> {
    storage: S,
    write_lock: Mutex<()>,
}

impl<S: StateStorage> AuthStateStore<S> {
    /// Wraps a storage backend.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads the persisted state, falling back to empty.
    pub async fn load(&self) -> AuthState {
        match self.storage.get(STATE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(error) => {
                    warn!(%error, "stored auth state is corrupt, starting empty");
                    AuthState::empty()
                }
            },
            Ok(None) => AuthState::empty(),
            Err(error) => {
                warn!(%error, "auth state storage unreadable, starting empty");
                AuthState::empty()
            }
        }
    }

    /// Persists a snapshot, replacing the previous one in full.
    ///
    /// # Errors
    ///
    /// Returns the storage failure. The caller's in-memory state stays
    /// authoritative for the process lifetime; persistence failures are
    /// logged there and never surfaced to API callers.
    pub async fn save(&self, state: &AuthState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)
            .map_err(|error| StorageError::Serialization(error.to_string()))?;

        let _guard = self.write_lock.lock().await;
        self.storage.put(STATE_KEY, &raw).await
    }

    /// Removes the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns the storage failure, as for [`AuthStateStore::save`].
    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.storage.delete(STATE_KEY).await
    }
}
