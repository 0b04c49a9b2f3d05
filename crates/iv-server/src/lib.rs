//! iv-server: admin HTTP surface and public read endpoint.
//!
//! - Session-cookie login for the configured admin account
//! - Image resource actions (list/show/new/edit/delete) with after pipelines
//! - Unauthenticated `GET {root}/api/image-urls/{id}` for the gallery widget

pub mod context;
pub mod error;
pub mod hooks;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use iv_core::config::Config;
use iv_upload::{CloudinaryClient, CloudinaryProvider, UploadProvider};

use crate::context::AppContext;

/// Start the imgvault server.
///
/// Opens the database, wires the Cloudinary provider and serves until a
/// shutdown signal is received.
pub async fn start(config: Config) -> iv_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    // Initialize database.
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = iv_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    if !config.cloudinary.is_configured() {
        tracing::warn!("Cloudinary credentials are not set; uploads will fail");
    }
    let client = CloudinaryClient::new(config.cloudinary.clone())?;
    let provider: Arc<dyn UploadProvider> = Arc::new(CloudinaryProvider::new(client, db.clone()));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| iv_core::Error::Internal(format!("Invalid server address: {e}")))?;
    let mount = router::mount_path(&config.server.root_path);

    let ctx = AppContext::new(db, config, provider);
    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| iv_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Admin started at http://{addr}{mount}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| iv_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
