// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tw: command-line client for the taxiway job queue.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod exit_error;
mod output;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tw_wire::IdWidth;

use crate::client::{ClientError, QueueClient};
use crate::commands::Command;
use crate::exit_error::{ExitError, EXIT_CONNECTION, EXIT_REJECTED};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "tw",
    version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")),
    about = "Submit, lease, and acknowledge jobs on a taxiway daemon"
)]
struct Cli {
    /// Daemon address
    #[arg(long, global = true, env = "TW_ADDR", default_value = "127.0.0.1:8294")]
    addr: String,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Id width in SUBMIT responses; must match the daemon (4 or 8)
    #[arg(long, global = true, env = "TW_SUBMIT_ID_WIDTH", default_value = "4")]
    id_width: IdWidth,

    /// Connect/read/write timeout in milliseconds
    #[arg(long, global = true, env = "TW_IPC_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = QueueClient::new(cli.addr, cli.id_width, Duration::from_millis(cli.timeout_ms));

    let Err(e) = commands::handle(cli.command, &client, cli.output).await else {
        return ExitCode::SUCCESS;
    };

    if let Some(exit) = e.downcast_ref::<ExitError>() {
        if !exit.message.is_empty() {
            eprintln!("Error: {}", exit.message);
        }
        return exit_code(exit.code);
    }

    let code = match e.downcast_ref::<ClientError>() {
        Some(err) if err.is_connection_failure() => EXIT_CONNECTION,
        _ => EXIT_REJECTED,
    };
    eprintln!("Error: {:#}", e);
    exit_code(code)
}
