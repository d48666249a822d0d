use std::sync::Arc;

use anyhow::Context;
use dex_server::config::Config;
use dex_server::orchestrator::GrpcResourceService;
use dex_server::shield::GrpcProjectService;
use dex_server::siren::SirenClient;
use dex_server::state::AppState;
use dex_server::transport::GrpcTransport;
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::load()?;
    let timeout = cfg.rpc_timeout();
    if cfg.firehose.latest_version.is_empty() {
        tracing::warn!("firehose.latest_version is not set, upgrades target an empty version");
    }

    let entropy = GrpcTransport::connect_lazy("entropy", &cfg.entropy.addr, timeout)
        .with_context(|| format!("invalid entropy address {}", cfg.entropy.addr))?;
    let shield = GrpcTransport::connect_lazy("shield", &cfg.shield.addr, timeout)
        .with_context(|| format!("invalid shield address {}", cfg.shield.addr))?;
    let siren = SirenClient::new(&cfg.siren.addr, timeout)?;

    let state = AppState::new(
        Arc::new(GrpcResourceService::new(entropy)),
        Arc::new(GrpcProjectService::new(shield)),
        Arc::new(siren),
        cfg.firehose_settings(),
    );
    let app = dex_server::router(state);

    let addr = cfg.service.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "dex-server HTTP listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
