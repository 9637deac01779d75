//! logline server binary.

use std::process::ExitCode;

use clap::Parser;
use logline_server::{Cli, LogFormat, LoglineServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.into_config();
    let addr = config.bind_addr;
    let server = LoglineServer::new(config);

    if let Err(e) = server.initialize().await {
        error!(error = %e, "Failed to initialize log store");
        return ExitCode::FAILURE;
    }

    info!("Starting log ingestion API on {}", addr);
    info!("  Ingest:    POST http://{}/logs", addr);
    info!("  Query:     GET  http://{}/logs", addr);
    info!("  Health:    GET  http://{}/health", addr);
    info!("  Live feed: ws://{}/ws", addr);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
