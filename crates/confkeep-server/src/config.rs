//! Server configuration for `confkeep`.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Everything except the shared secret has a default; a missing secret is a
//! startup error so the server never runs unauthenticated.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listen port, matching the UI's dev proxy.
const DEFAULT_PORT: u16 = 3001;

/// Configuration errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The shared secret is not set (or is empty).
    #[error("AUTH_PASSWORD is not set; refusing to start without a shared secret")]
    MissingSecret,

    /// The bind address could not be parsed.
    #[error("invalid bind address '{value}': {reason}")]
    InvalidBindAddr { value: String, reason: String },
}

/// The shared secret presented by clients. Never printed.
#[derive(Clone)]
pub struct AuthSecret(String);

impl AuthSecret {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret bytes, for comparison.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for AuthSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthSecret([redacted])")
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Path of the JSON config document.
    pub document_path: PathBuf,
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Directory of built UI assets served at `/` (optional).
    pub ui_dir: Option<PathBuf>,
    /// Shared secret required on every `/api` request.
    pub auth_secret: AuthSecret,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CONFKEEP_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:3001`)
    /// - `PORT`: port to bind on, on all interfaces
    /// - `CONFKEEP_DOCUMENT_PATH`: JSON document path (default: `./db.json`)
    /// - `CONFKEEP_DB_PATH` / `DB_PATH`: SQLite file path (default: `./data.db`)
    /// - `CONFKEEP_LOG_LEVEL`: log filter (default: `info`)
    /// - `CONFKEEP_UI_DIR`: directory of UI assets to serve (optional)
    /// - `AUTH_PASSWORD`: shared secret (required)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] if `AUTH_PASSWORD` is unset or
    /// empty, and [`ConfigError::InvalidBindAddr`] for an unparsable address.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let auth_secret = var("AUTH_PASSWORD")
            .filter(|s| !s.is_empty())
            .map(AuthSecret::new)
            .ok_or(ConfigError::MissingSecret)?;

        // Priority: CONFKEEP_BIND_ADDR > PORT > default 127.0.0.1:3001
        let bind_addr = if let Some(addr) = var("CONFKEEP_BIND_ADDR") {
            addr.parse::<SocketAddr>().map_err(|e| ConfigError::InvalidBindAddr {
                reason: e.to_string(),
                value: addr,
            })?
        } else if let Some(port_str) = var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(DEFAULT_PORT);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))
        };

        let document_path = var("CONFKEEP_DOCUMENT_PATH")
            .map_or_else(|| PathBuf::from("./db.json"), PathBuf::from);

        let database_path = var("CONFKEEP_DB_PATH")
            .or_else(|| var("DB_PATH"))
            .map_or_else(|| PathBuf::from("./data.db"), PathBuf::from);

        let log_level = var("CONFKEEP_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let ui_dir = var("CONFKEEP_UI_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            document_path,
            database_path,
            log_level,
            ui_dir,
            auth_secret,
        })
    }
}
