//! Reactivities API server.
//!
//! Activities, attendance and user accounts over a JSON HTTP API, backed by
//! SQLite.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use reactivities::auth::session::run_purge_loop;
use reactivities::config::{self, AppConfig};
use reactivities::http::HttpServer;
use reactivities::lifecycle::signals::wait_for_shutdown_signal;
use reactivities::lifecycle::startup::{bind_listener, initialize};
use reactivities::lifecycle::Shutdown;
use reactivities::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "reactivities", version, about = "Reactivities API server")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "REACTIVITIES_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("reactivities: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "reactivities starting"
    );

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

fn load(args: &Args) -> Result<AppConfig, config::ConfigError> {
    match &args.config {
        Some(path) => config::load_config(path),
        None => config::loader::default_config(),
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = initialize(&config).await?;
    let shutdown = Shutdown::new();

    tokio::spawn(run_purge_loop(
        services.sessions.clone(),
        Duration::from_secs(config.auth.purge_interval_secs.max(1)),
        shutdown.subscribe(),
    ));

    let listener = bind_listener(&config).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        tls = config.listener.tls.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let server = HttpServer::new(config, services.db, services.sessions);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_shutdown_signal().await;
    shutdown.trigger();

    server_task.await??;
    Ok(())
}
