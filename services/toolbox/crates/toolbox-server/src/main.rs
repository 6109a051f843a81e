//! confgate toolbox entry point.
//!
//! Initialises tracing, loads configuration from `CONFGATE_*` environment
//! variables, and serves two listeners: the Streamable-HTTP MCP server for
//! the agent and the loopback-only admin API for the operator.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum_server::tls_rustls::RustlsConfig;
use tracing_subscriber::EnvFilter;

use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};

use confgate_common::{ENV_PREFIX, ToolboxConfig};
use confgate_toolbox::{admin, shutdown};
use confgate_toolbox::state::AppState;
use confgate_toolbox::tools::ConfgateTools;

/// Health-check handler for container / load-balancer probes.
async fn health() -> StatusCode {
    StatusCode::OK
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("confgate-toolbox starting");

    let config: ToolboxConfig = envy::prefixed(ENV_PREFIX).from_env().context(
        "failed to load config from CONFGATE_* env vars (CONFGATE_SSH_HOST is required)",
    )?;
    config.validate().context("invalid configuration")?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        admin_addr = %config.admin_addr,
        ssh_host = %config.ssh_host,
        ssh_user = %config.ssh_user,
        agent_can_apply = config.agent_can_apply,
        tls_enabled = config.tls_cert.is_some(),
        "configuration loaded",
    );

    let state = Arc::new(AppState::from_config(&config));

    // Admin API: loopback only, plaintext.
    let admin_router = admin::router(state.changes.clone(), &state.defaults.nginx_container);
    let admin_listener = tokio::net::TcpListener::bind(config.admin_addr)
        .await
        .with_context(|| format!("failed to bind admin listener on {}", config.admin_addr))?;
    tracing::info!("admin API ready on http://{}", config.admin_addr);
    let admin_task = tokio::spawn(async move {
        axum::serve(admin_listener, admin_router)
            .with_graceful_shutdown(shutdown::ctrl_c())
            .await
    });

    // MCP: a fresh ConfgateTools per session, all sharing one AppState.
    let state_for_factory = state.clone();
    let service = StreamableHttpService::new(
        move || Ok(ConfgateTools::new(state_for_factory.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = axum::Router::new()
        .nest_service("/mcp", service)
        .route("/health", axum::routing::get(health));

    if let (Some(cert_path), Some(key_path)) = (&config.tls_cert, &config.tls_key) {
        tracing::info!(%cert_path, "TLS enabled");
        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .context("failed to load TLS certificates")?;

        tracing::info!("MCP server ready on https://{}/mcp", config.listen_addr);
        axum_server::bind_rustls(config.listen_addr, tls_config)
            .handle(shutdown::handle_on(shutdown::ctrl_c()))
            .serve(router.into_make_service())
            .await
            .context("HTTPS server error")?;
    } else {
        let listener = tokio::net::TcpListener::bind(config.listen_addr)
            .await
            .context("failed to bind TCP listener")?;

        tracing::info!(
            "MCP server ready on http://{}/mcp (TLS disabled)",
            config.listen_addr
        );
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown::ctrl_c())
            .await
            .context("HTTP server error")?;
    }

    admin_task
        .await
        .context("admin server task panicked")?
        .context("admin server error")?;

    tracing::info!("confgate-toolbox shut down");
    Ok(())
}
