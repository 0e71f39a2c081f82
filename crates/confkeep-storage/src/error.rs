//! Storage error types.
//!
//! Every error variant carries enough context to diagnose the problem
//! without a debugger: the location that failed and the underlying reason.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open or create the storage at the given location.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read the document.
    #[error("failed to read document '{path}': {reason}")]
    Read { path: String, reason: String },

    /// The document exists but is not valid JSON.
    #[error("document '{path}' is not valid JSON: {reason}")]
    Corrupt { path: String, reason: String },

    /// Failed to write the document.
    #[error("failed to write document '{path}': {reason}")]
    Write { path: String, reason: String },

    /// Failed to bootstrap the relational schema.
    #[error("failed to prepare table '{table}': {reason}")]
    Schema { table: String, reason: String },
}
