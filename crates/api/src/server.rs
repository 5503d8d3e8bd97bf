use std::future::Future;
use std::net::SocketAddr;

use spyglass_core::error::{Result, SpyglassError};
use tokio::net::TcpListener;

use crate::http::{AppState, RouterConfig, router};

pub async fn run_http_server<F>(
    state: AppState,
    cfg: RouterConfig,
    addr: SocketAddr,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| SpyglassError::Io(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(%addr, "http api listening");

    axum::serve(listener, router(state, &cfg))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SpyglassError::Io(format!("HTTP server failed: {e}")))
}
