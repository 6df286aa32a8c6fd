use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber;

use crpt_client::api::HttpTransport;
use crpt_client::config::CrptConfig;
use crpt_client::document::Document;
use crpt_client::submit::SubmissionClient;

/// Rate-limited submission client for the CRPT document registration API.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting CRPT Submission Client");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match args.config {
        Some(path) => CrptConfig::from_file(&path)?,
        None => CrptConfig::default(),
    };
    config.validate()?;
    info!(
        endpoint = %config.api.endpoint,
        window_secs = config.rate_limit.window_secs,
        max_requests = config.rate_limit.max_requests_per_window,
        "Configuration loaded"
    );

    // Initialize the submission pipeline
    let transport = Arc::new(HttpTransport::new(&config.api)?);
    let (client, dispatcher) = SubmissionClient::new(&config.rate_limit, transport)?;
    info!("Submission pipeline initialized");

    // Run the dispatch loop with graceful shutdown on Ctrl+C
    let dispatcher_handle = tokio::spawn(dispatcher.run_with_shutdown(shutdown_signal()));

    // Issue one sample submission
    let seq = client.submit(Document::default(), "signature").await?;
    info!(seq, "Sample document admitted");

    dispatcher_handle.await?;

    info!("CRPT Submission Client stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
