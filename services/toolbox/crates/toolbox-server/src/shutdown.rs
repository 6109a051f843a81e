//! Shutdown wiring shared by the MCP and admin listeners.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum_server::Handle;

/// How long in-flight requests get to finish once shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Resolve on SIGINT (Ctrl-C).
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

/// An `axum_server` handle that begins a graceful shutdown once `signal`
/// resolves. `axum_server` takes no shutdown future, so this stands in for
/// `axum::serve(..).with_graceful_shutdown(..)`.
pub fn handle_on<F>(signal: F) -> Handle<SocketAddr>
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = Handle::new();
    let trigger = handle.clone();
    tokio::spawn(async move {
        signal.await;
        trigger.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });
    handle
}
