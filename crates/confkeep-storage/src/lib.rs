//! Storage layer for `confkeep`.
//!
//! This crate defines the [`DocumentBackend`] trait, a whole-document JSON
//! persistence interface that knows nothing about projects or keys. The
//! project store in `confkeep-core` loads the document, mutates it in memory,
//! and saves it back through a backend.
//!
//! Two document backends are provided:
//!
//! - [`FileDocument`]: production default, a pretty-printed JSON file on disk
//! - [`MemoryDocument`]: in-memory, for testing only
//!
//! The relational side lives in [`sqlite`]: it opens the SQLite database file
//! and makes sure the `cookies` table exists.

mod error;
mod file;
mod memory;
pub mod sqlite;

pub use error::StorageError;
pub use file::FileDocument;
pub use memory::MemoryDocument;

use serde_json::Value;

/// A pluggable whole-document storage backend.
///
/// Every call reads or writes the complete document. Backends never cache
/// between calls: storage is the single source of truth, and callers are
/// responsible for serializing read-modify-write sequences.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait DocumentBackend: Send + Sync + 'static {
    /// Read and parse the entire document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the document cannot be read and
    /// [`StorageError::Corrupt`] if it is not valid JSON.
    async fn load(&self) -> Result<Value, StorageError>;

    /// Replace the entire document.
    ///
    /// A subsequent [`load`](DocumentBackend::load) must observe either the
    /// previous document or this one, never a partial write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn save(&self, document: &Value) -> Result<(), StorageError>;

    /// Human-readable location of the document, used in logs and errors.
    fn location(&self) -> String;
}

/// The document written when no document exists yet.
#[must_use]
pub fn empty_document() -> Value {
    serde_json::json!({ "projects": {} })
}
