mod config;
mod error;
mod handlers;
mod router;
mod sequencer;
mod state;

use commitment::ThresholdSigner;
use config::Config;
use router::create_router;
use sequencer::Sequencer;
use state::AppState;
use std::sync::Arc;
use submitter::{BatchSubmitter, HttpChainClient, SubmitterConfig, TxSigner};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting CLOB sequencer");

    let config = Config::from_env()?;

    let chain = HttpChainClient::connect(config.rpc_url.as_str())?;
    let tx_signer = TxSigner::from_hex(&config.private_key)?;

    let mut submitter_config = SubmitterConfig::new(config.contract_address);
    submitter_config.max_retries = config.max_retries;
    submitter_config.backoff = config.backoff;
    let batch_submitter = BatchSubmitter::new(chain, tx_signer, submitter_config);

    let threshold_signer = match &config.bls_keys {
        Some(raw) => ThresholdSigner::from_env_value(raw),
        None => {
            warn!("BLS_KEYS not set, threshold signer running in mock mode");
            ThresholdSigner::mock()
        }
    };

    let sequencer = Arc::new(Sequencer::new(
        threshold_signer,
        batch_submitter,
        config.max_batch,
    ));
    let app = create_router(AppState::new(sequencer));

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, rpc = %config.rpc_url, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received, stopping server");
}
