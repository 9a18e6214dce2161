//! Control-plane server entry point.
//!
//! Reads [`ServerSettings`] from flags and environment, applies the schema,
//! wires the Postgres, Docker, and sidecar adapters into the HTTP router,
//! and serves until interrupted.

use clap::Parser;
use eyre::WrapErr;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vibe_control::config_vault::adapters::{aes::AesGcmCipher, postgres::PostgresConfigRepository};
use vibe_control::http::{
    self,
    state::{AppOptions, AppPorts, AppState},
};
use vibe_control::interaction::adapters::postgres::PostgresInteractionRepository;
use vibe_control::postgres::{self, PgPool};
use vibe_control::session::adapters::postgres::PostgresSessionRepository;
use vibe_control::settings::ServerSettings;
use vibe_control::sidecar::adapters::http::HttpSidecarClient;
use vibe_control::task::adapters::postgres::PostgresTaskRepository;
use vibe_control::telemetry;
use vibe_control::workspace::adapters::{
    docker::DockerOrchestrator, postgres::PostgresProjectRepository,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let settings = ServerSettings::parse();
    telemetry::init(&settings.log()).wrap_err("failed to install the log subscriber")?;
    tracing::info!(environment = %settings.environment, port = settings.port, "starting control plane");

    let cipher = AesGcmCipher::from_base64_key(&settings.config_encryption_key)
        .wrap_err("CONFIG_ENCRYPTION_KEY is invalid")?;
    let pool = connect(&settings).await?;
    let orchestrator =
        DockerOrchestrator::connect(settings.docker()).wrap_err("failed to reach Docker")?;
    let sidecar = Arc::new(
        HttpSidecarClient::new(settings.sidecar()).wrap_err("failed to build sidecar client")?,
    );

    let shutdown = CancellationToken::new();
    let ports = AppPorts {
        projects: Arc::new(PostgresProjectRepository::new(pool.clone())),
        orchestrator: Arc::new(orchestrator),
        tasks: Arc::new(PostgresTaskRepository::new(pool.clone())),
        sessions: Arc::new(PostgresSessionRepository::new(pool.clone())),
        interactions: Arc::new(PostgresInteractionRepository::new(pool.clone())),
        configs: Arc::new(PostgresConfigRepository::new(pool)),
        cipher: Arc::new(cipher),
        runner: sidecar.clone(),
        relay: sidecar,
    };
    let options = AppOptions {
        workspace: settings.workspace(),
        connection: settings.connection(),
        internal_secret: settings.shared_secret.clone(),
        shutdown: shutdown.clone(),
    };
    let router = http::router(AppState::assemble(ports, options));

    let address = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .wrap_err_with(|| format!("failed to bind {address}"))?;
    tracing::info!(%address, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_interrupt(shutdown))
        .await
        .wrap_err("server failed")?;
    tracing::info!("control plane stopped");
    Ok(())
}

/// Builds the connection pool and applies the schema.
async fn connect(settings: &ServerSettings) -> eyre::Result<PgPool> {
    let url = settings.database_url.clone();
    let size = settings.database_pool_size;
    let pool = tokio::task::spawn_blocking(move || postgres::open(&url, size))
        .await
        .wrap_err("database setup task panicked")??;
    tracing::info!(max_connections = size, "database ready");
    Ok(pool)
}

/// Resolves on Ctrl-C, cancelling every stream and bridge first.
async fn wait_for_interrupt(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for interrupt");
    }
    tracing::info!("shutting down");
    shutdown.cancel();
}
