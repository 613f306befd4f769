//! File-backed key-value store.

use std::path::{Path, PathBuf};

use beacon_application::ports::{StateStorage, StorageError};
use tokio::fs;

/// Key-value storage as one JSON-bearing file per key inside a data
/// directory.
///
/// Writes go to a temporary sibling file first and are renamed into
/// place, so a reader concurrent with a write sees either the previous
/// content or the new content in full, never a torn file.
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    directory: PathBuf,
}

impl FileStateStorage {
    /// Uses the given directory, creating it lazily on first write.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Uses the platform data directory under `app_name`.
    ///
    /// Falls back to a relative `.{app_name}` directory when the
    /// platform reports no data directory (some containers).
    #[must_use]
    pub fn in_data_dir(app_name: &str) -> Self {
        let directory = dirs::data_dir().map_or_else(
            || PathBuf::from(format!(".{app_name}")),
            |base| base.join(app_name),
        );
        Self::new(directory)
    }

    /// The directory holding the stored files.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are internal identifiers, not user input, but keep them
        // filesystem-safe anyway.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.directory.join(format!("{safe}.json"))
    }
}

impl StateStorage for FileStateStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StorageError::Io(error)),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.directory).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StorageError::Io(error)),
        }
    }
}
