use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dokumenter_saf::SafClient;
use dokumenter_server::auth::TokenValidator;
use dokumenter_server::{router, telemetry, AppState, GatewayConfig};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "dokumenter", version, about = "Gateway to the SAF document archive")]
struct Args {
    /// Listen port.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// File receiving `secure_log` events. Dropped when unset.
    #[arg(long, env = "SECURE_LOG_PATH")]
    secure_log_path: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init(args.secure_log_path.as_deref())?;

    let config = GatewayConfig::from_env().context("invalid configuration")?;
    tracing::info!(saf_host = %config.saf.host, issuer = %config.auth.issuer, "starting dokumenter");

    let validator = TokenValidator::from_config(config.auth).context("failed to set up token validation")?;
    let client = SafClient::new(config.saf, config.azure).context("failed to set up SAF client")?;
    let app = router(AppState::with_saf_client(validator, client));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
