//! Project store: CRUD over `{ "projects": { name: { key: value } } }`.
//!
//! Every operation re-reads the whole document from the backend; nothing is
//! cached between calls. Mutations run as load → mutate in memory → save
//! inside one async mutex, so concurrent requests cannot interleave their
//! read-modify-write sequences. A failed mutation never reaches `save`, which
//! leaves the stored document untouched.
//!
//! Project bodies are kept as raw JSON values. Key-level rules (no duplicate
//! key on add, no overwrite on copy) belong to the caller, which sends the
//! final mapping through [`ProjectStore::replace_project`].

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use confkeep_storage::DocumentBackend;

use crate::error::ProjectError;

/// The `projects` mapping: project name to project body.
pub type Projects = Map<String, Value>;

const PROJECTS_FIELD: &str = "projects";
/// Legacy singular field, only touched by [`ProjectStore::delete_top_level_key`].
const LEGACY_PROJECT_FIELD: &str = "project";

/// Project CRUD over a shared JSON document.
pub struct ProjectStore {
    backend: Arc<dyn DocumentBackend>,
    /// Serializes every load/save pair.
    lock: Mutex<()>,
}

impl std::fmt::Debug for ProjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectStore")
            .field("backend", &self.backend.location())
            .finish_non_exhaustive()
    }
}

impl ProjectStore {
    /// Create a project store over the given document backend.
    #[must_use]
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    /// Return the entire document.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Storage`] if the document cannot be read or parsed.
    pub async fn get_config(&self) -> Result<Value, ProjectError> {
        let _guard = self.lock.lock().await;
        Ok(self.backend.load().await?)
    }

    /// Overwrite the entire document verbatim.
    ///
    /// No schema is enforced: any JSON value is persisted as-is, including
    /// one without a `projects` field.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Storage`] if the write fails.
    pub async fn replace_config(&self, document: Value) -> Result<(), ProjectError> {
        let _guard = self.lock.lock().await;
        self.backend.save(&document).await?;
        tracing::info!(location = %self.backend.location(), "config document replaced");
        Ok(())
    }

    /// Return the `projects` mapping, or an empty mapping if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Storage`] if the document cannot be read or parsed.
    pub async fn list_projects(&self) -> Result<Projects, ProjectError> {
        let document = self.get_config().await?;
        Ok(document
            .get(PROJECTS_FIELD)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default())
    }

    /// Return a single project body.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::ProjectNotFound`] if the project does not exist.
    pub async fn get_project(&self, name: &str) -> Result<Value, ProjectError> {
        self.list_projects()
            .await?
            .remove(name)
            .ok_or_else(|| ProjectError::ProjectNotFound {
                name: name.to_owned(),
            })
    }

    /// Create a project. `initial_data` defaults to an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::DuplicateProject`] if the name is taken.
    pub async fn create_project(
        &self,
        name: &str,
        initial_data: Option<Value>,
    ) -> Result<(), ProjectError> {
        self.mutate(|document| {
            let projects = projects_mut(document)?;
            if projects.contains_key(name) {
                return Err(ProjectError::DuplicateProject {
                    name: name.to_owned(),
                });
            }
            projects.insert(
                name.to_owned(),
                initial_data.unwrap_or_else(|| Value::Object(Map::new())),
            );
            Ok(())
        })
        .await?;

        tracing::info!(project = %name, "project created");
        Ok(())
    }

    /// Overwrite a project's body wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::ProjectNotFound`] if the project does not exist.
    pub async fn replace_project(&self, name: &str, data: Value) -> Result<(), ProjectError> {
        self.mutate(|document| {
            let slot = projects_mut(document)?
                .get_mut(name)
                .ok_or_else(|| ProjectError::ProjectNotFound {
                    name: name.to_owned(),
                })?;
            *slot = data;
            Ok(())
        })
        .await?;

        tracing::info!(project = %name, "project replaced");
        Ok(())
    }

    /// Delete a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::ProjectNotFound`] if the project does not exist.
    pub async fn delete_project(&self, name: &str) -> Result<(), ProjectError> {
        self.mutate(|document| {
            projects_mut(document)?
                .remove(name)
                .map(drop)
                .ok_or_else(|| ProjectError::ProjectNotFound {
                    name: name.to_owned(),
                })
        })
        .await?;

        tracing::info!(project = %name, "project deleted");
        Ok(())
    }

    /// Delete `key` from the legacy singular `project` field.
    ///
    /// This does not touch `projects`. Older documents may still carry a
    /// `project` mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::KeyNotFound`] if `project` is absent, is not an
    /// object, or lacks `key`.
    pub async fn delete_top_level_key(&self, key: &str) -> Result<(), ProjectError> {
        self.mutate(|document| {
            document
                .get_mut(LEGACY_PROJECT_FIELD)
                .and_then(Value::as_object_mut)
                .and_then(|legacy| legacy.remove(key))
                .map(drop)
                .ok_or_else(|| ProjectError::KeyNotFound {
                    key: key.to_owned(),
                })
        })
        .await?;

        tracing::info!(key = %key, "legacy project key deleted");
        Ok(())
    }

    /// Load, apply `f`, and save only if `f` succeeds.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Value) -> Result<T, ProjectError>,
    ) -> Result<T, ProjectError> {
        let _guard = self.lock.lock().await;
        let mut document = self.backend.load().await?;
        let out = f(&mut document)?;
        self.backend.save(&document).await?;
        Ok(out)
    }
}

/// Borrow the `projects` mapping, creating it when absent or `null`.
fn projects_mut(document: &mut Value) -> Result<&mut Projects, ProjectError> {
    let root = document
        .as_object_mut()
        .ok_or_else(|| ProjectError::InvalidDocument {
            reason: "document root is not a JSON object".to_owned(),
        })?;

    let slot = root.entry(PROJECTS_FIELD).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
        .ok_or_else(|| ProjectError::InvalidDocument {
            reason: "'projects' is not a JSON object".to_owned(),
        })
}
