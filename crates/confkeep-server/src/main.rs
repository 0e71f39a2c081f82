//! `confkeep` server entry point.
//!
//! Loads configuration, opens the JSON document and the SQLite database,
//! then starts the Axum HTTP server with graceful shutdown. A missing shared
//! secret aborts startup before anything is opened.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use confkeep_core::cookie::CookieStore;
use confkeep_core::project::ProjectStore;
use confkeep_core::query::QueryGateway;
use confkeep_storage::FileDocument;

use confkeep_server::app::build_router;
use confkeep_server::config::ServerConfig;
use confkeep_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment.
    let config = ServerConfig::from_env().context("invalid server configuration")?;

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(
        document = %config.document_path.display(),
        database = %config.database_path.display(),
        "confkeep starting"
    );

    let state = build_app_state(&config).await?;
    let app = build_router(state, config.ui_dir.as_deref());

    if let Some(ref dir) = config.ui_dir {
        info!(path = %dir.display(), "serving UI assets");
    }

    // Bind and serve.
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "confkeep server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("confkeep server stopped");
    Ok(())
}

/// Open both stores and build the shared application state.
async fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let document = FileDocument::open(&config.document_path)
        .await
        .context("failed to open config document")?;
    info!(path = %document.path().display(), "using JSON document storage");

    let pool = confkeep_storage::sqlite::open(&config.database_path)
        .await
        .context("failed to open SQLite database")?;
    info!(path = %config.database_path.display(), "using SQLite storage");

    Ok(Arc::new(AppState {
        project_store: Arc::new(ProjectStore::new(Arc::new(document))),
        query_gateway: Arc::new(QueryGateway::new(pool.clone())),
        cookie_store: Arc::new(CookieStore::new(pool)),
        auth_secret: config.auth_secret.clone(),
    }))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
