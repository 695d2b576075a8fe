use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::error::{PredictError, Result};
use crate::services::PredictionService;

/// Bind the listener. Kept separate from `serve` so callers (and tests) can
/// bind port 0 and learn the real address before serving.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port)).await.map_err(|e| {
        PredictError::Internal(format!("failed to bind {host}:{port}: {e}"))
    })
}

/// Serve the prediction API on an already bound listener until shutdown.
pub async fn serve(listener: TcpListener, service: Arc<PredictionService>) -> Result<()> {
    let app = create_router(AppState::new(service));

    info!("🚀 Prediction API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Prediction API stopped");
    Ok(())
}

/// Start the API server
pub async fn start_api_server(
    service: Arc<PredictionService>,
    host: &str,
    port: u16,
) -> Result<()> {
    let listener = bind(host, port).await?;
    serve(listener, service).await
}

/// Start the API server in the background on an ephemeral-friendly listener
pub async fn start_api_server_background(
    service: Arc<PredictionService>,
    host: &str,
    port: u16,
) -> Result<(SocketAddr, tokio::task::JoinHandle<Result<()>>)> {
    let listener = bind(host, port).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move { serve(listener, service).await });

    Ok((addr, handle))
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
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
