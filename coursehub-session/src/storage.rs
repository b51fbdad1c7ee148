//! Session Storage - Durable key-value backends for the session snapshot

use coursehub_core::{storage_error, CourseHubError, CourseHubResult, ErrorContext};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Key-value persistence substrate the session store writes through
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`, `None` if nothing was stored
    fn load(&self, key: &str) -> CourseHubResult<Option<String>>;

    /// Replace the value stored under `key`
    fn save(&self, key: &str, value: &str) -> CourseHubResult<()>;

    fn remove(&self, key: &str) -> CourseHubResult<()>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    storage_dir: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `storage_dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(storage_dir: P) -> CourseHubResult<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();

        std::fs::create_dir_all(&storage_dir).map_err(|e| CourseHubError::Storage {
            message: format!(
                "Failed to create storage directory {}: {}",
                storage_dir.display(),
                e
            ),
            source: Some(Box::new(e)),
            context: ErrorContext::new("file_storage")
                .with_operation("create_dir")
                .with_suggestion("Check that the data directory is writable"),
        })?;

        info!("Session storage initialized at: {}", storage_dir.display());

        Ok(Self { storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn path_for(&self, key: &str) -> CourseHubResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(storage_error!(
                format!("Invalid storage key: {:?}", key),
                "file_storage"
            ));
        }
        Ok(self.storage_dir.join(format!("{}.json", key)))
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: &str) -> CourseHubResult<Option<String>> {
        let path = self.path_for(key)?;

        match std::fs::read_to_string(&path) {
            Ok(data) => {
                debug!("Loaded {} from {}", key, path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error!(
                format!("Failed to read {}: {}", path.display(), e),
                "file_storage",
                e
            )),
        }
    }

    fn save(&self, key: &str, value: &str) -> CourseHubResult<()> {
        let path = self.path_for(key)?;

        std::fs::write(&path, value).map_err(|e| {
            storage_error!(
                format!("Failed to write {}: {}", path.display(), e),
                "file_storage",
                e
            )
        })?;

        debug!("Saved {} to {}", key, path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> CourseHubResult<()> {
        let path = self.path_for(key)?;

        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error!(
                format!("Failed to delete {}: {}", path.display(), e),
                "file_storage",
                e
            )),
        }
    }
}

/// In-process storage; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: &str) -> CourseHubResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> CourseHubResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CourseHubResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}
