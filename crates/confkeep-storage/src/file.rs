//! JSON-file document backend, the production default.
//!
//! The whole document lives in a single pretty-printed JSON file that stays
//! human-editable. Writes go to a sibling `*.tmp` file which is then renamed
//! over the document, so a reader never observes a half-written file.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::{DocumentBackend, StorageError, empty_document};

/// A document backend backed by a JSON file.
///
/// # Examples
///
/// ```no_run
/// # use confkeep_storage::{DocumentBackend, FileDocument};
/// # #[tokio::main]
/// # async fn main() {
/// let doc = FileDocument::open("./db.json").await.unwrap();
/// let value = doc.load().await.unwrap();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    /// Open the document at `path`, creating it as `{"projects": {}}` if it
    /// does not exist yet. Parent directories are created as needed.
    ///
    /// An existing file is left untouched, even if it is not valid JSON; that
    /// surfaces on the first [`load`](DocumentBackend::load).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file or its parent directory
    /// cannot be created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |reason: String| StorageError::Open {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| open_err(e.to_string()))?;
        }

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| open_err(e.to_string()))?;

        let backend = Self { path };
        if !exists {
            tracing::info!(path = %backend.path.display(), "creating empty config document");
            backend
                .save(&empty_document())
                .await
                .map_err(|e| StorageError::Open {
                    path: backend.path.display().to_string(),
                    reason: e.to_string(),
                })?;
        }

        Ok(backend)
    }

    /// Return the filesystem path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl DocumentBackend for FileDocument {
    async fn load(&self) -> Result<Value, StorageError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::Read {
                path: self.location(),
                reason: e.to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
            path: self.location(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, document: &Value) -> Result<(), StorageError> {
        let write_err = |reason: String| StorageError::Write {
            path: self.location(),
            reason,
        };

        let bytes = serde_json::to_vec_pretty(document).map_err(|e| write_err(e.to_string()))?;

        let tmp = self.temp_path();
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| write_err(format!("failed to create '{}': {e}", tmp.display())))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| write_err(e.to_string()))?;
        file.sync_all().await.map_err(|e| write_err(e.to_string()))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| write_err(format!("failed to replace document: {e}")))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
