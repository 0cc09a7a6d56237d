// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! twd: the taxiway job queue daemon.

use std::process::ExitCode;

use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tw_daemon::shutdown::install_shutdown_handler;
use tw_daemon::{startup, Config};

/// Install the global subscriber. Logs go to `TW_LOG_DIR/twd.log` when set,
/// stderr otherwise. The returned guard flushes the file writer on drop.
fn init_logging(config: &Config) -> std::io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, "twd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("twd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("twd: failed to open log directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let daemon = match startup(config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = install_shutdown_handler(daemon.cancel_token()) {
        error!("Failed to install signal handlers: {}", e);
        let _ = daemon.shutdown().await;
        return ExitCode::FAILURE;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "READY");
    daemon.cancelled().await;

    match daemon.shutdown().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Shutdown failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
