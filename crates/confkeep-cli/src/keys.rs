//! Key mutation policy for a single project's mapping.
//!
//! The server replaces a project body wholesale, so key-level edits are
//! applied here against the fetched mapping before it is sent back.

use serde_json::{Map, Value};

/// A key-level edit against one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEdit {
    /// Insert a new key. Rejected if the key exists.
    Add { key: String, value: String },
    /// Change the value of an existing key.
    Set { key: String, value: String },
    /// Duplicate `from` under `to`. Rejected if `to` exists.
    Copy { from: String, to: String },
    /// Drop a key.
    Remove { key: String },
}

/// Whether an edit changed the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// Nothing to write (missing key, or value already current).
    Unchanged,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyEditError {
    #[error("key '{key}' already exists, refusing to add it again")]
    KeyExists { key: String },

    #[error("cannot copy '{from}': key not found")]
    SourceMissing { from: String },

    #[error("cannot copy to '{to}': key already exists")]
    TargetExists { to: String },
}

impl KeyEdit {
    /// Apply the edit in place.
    ///
    /// # Errors
    ///
    /// Returns `KeyEditError` when the edit would overwrite an existing key
    /// or copy from a missing one. The mapping is untouched on error.
    pub fn apply(&self, data: &mut Map<String, Value>) -> Result<Applied, KeyEditError> {
        match self {
            Self::Add { key, value } => {
                if data.contains_key(key) {
                    return Err(KeyEditError::KeyExists { key: key.clone() });
                }
                data.insert(key.clone(), Value::String(value.clone()));
                Ok(Applied::Changed)
            }
            Self::Set { key, value } => match data.get_mut(key) {
                Some(current) if current.as_str() == Some(value.as_str()) => {
                    Ok(Applied::Unchanged)
                }
                Some(current) => {
                    *current = Value::String(value.clone());
                    Ok(Applied::Changed)
                }
                None => Ok(Applied::Unchanged),
            },
            Self::Copy { from, to } => {
                if data.contains_key(to) {
                    return Err(KeyEditError::TargetExists { to: to.clone() });
                }
                let value = data
                    .get(from)
                    .cloned()
                    .ok_or_else(|| KeyEditError::SourceMissing { from: from.clone() })?;
                data.insert(to.clone(), value);
                Ok(Applied::Changed)
            }
            Self::Remove { key } => Ok(if data.remove(key).is_some() {
                Applied::Changed
            } else {
                Applied::Unchanged
            }),
        }
    }
}
