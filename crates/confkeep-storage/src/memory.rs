//! In-memory document backend for testing.
//!
//! Holds the document behind a `RwLock`. Not persistent: everything is lost
//! when the process exits. Use it in unit tests that need a real backend
//! without touching disk.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::{DocumentBackend, StorageError, empty_document};

/// An in-memory document backend.
///
/// Clones share the same document.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    data: Arc<RwLock<Value>>,
}

impl MemoryDocument {
    /// Create a backend holding `{"projects": {}}`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_document(empty_document())
    }

    /// Create a backend holding the given document.
    #[must_use]
    pub fn with_document(document: Value) -> Self {
        Self {
            data: Arc::new(RwLock::new(document)),
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DocumentBackend for MemoryDocument {
    async fn load(&self) -> Result<Value, StorageError> {
        Ok(self.data.read().await.clone())
    }

    async fn save(&self, document: &Value) -> Result<(), StorageError> {
        *self.data.write().await = document.clone();
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn starts_with_empty_projects() {
        let backend = MemoryDocument::new();
        assert_eq!(backend.load().await.unwrap(), json!({ "projects": {} }));
    }

    #[tokio::test]
    async fn save_overwrites_existing() {
        let backend = MemoryDocument::new();
        backend.save(&json!({ "v": 1 })).await.unwrap();
        backend.save(&json!({ "v": 2 })).await.unwrap();
        assert_eq!(backend.load().await.unwrap(), json!({ "v": 2 }));
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let backend = MemoryDocument::new();
        let clone = backend.clone();
        backend.save(&json!([1, 2, 3])).await.unwrap();
        assert_eq!(clone.load().await.unwrap(), json!([1, 2, 3]));
    }
}
