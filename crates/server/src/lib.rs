//! Asset server: serves an embedded zip bundle of the static web client over
//! HTTP. The archive is loaded once at startup, indexed in memory, and
//! served read-only for the remainder of the process — no file system
//! extraction ever occurs.

pub mod archive;
pub mod content_type;
pub mod error;
pub mod router;

use std::{net::SocketAddr, sync::Arc};

pub use archive::AssetIndex;
pub use error::{Error, Result};

/// Default port the asset server binds when the caller doesn't override it.
pub const DEFAULT_PORT: u16 = 8080;

/// Loads the embedded bundle, binds `port` on every interface, and serves
/// it until a shutdown signal arrives. Ports below 1024 are passed through
/// to the OS bind call unchanged; on most platforms that fails with a
/// permission error unless the process is privileged, which surfaces here
/// as [`Error::Io`].
pub async fn serve(port: u16) -> Result<()> {
    let index = Arc::new(AssetIndex::load()?);
    tracing::info!(entries = index.len(), "loaded embedded asset bundle");

    let app = router::build_router(index);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "asset server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("asset server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(error) => tracing::warn!(%error, "failed to install SIGTERM handler"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}
