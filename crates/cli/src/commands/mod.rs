// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod stress;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use tw_core::JobId;

use crate::client::QueueClient;
use crate::exit_error::ExitError;
use crate::output::{payload_text, print_result, OutputFormat};

#[derive(Subcommand)]
pub enum Command {
    /// Submit a job
    Submit {
        /// Payload as a string
        #[arg(required_unless_present = "file")]
        data: Option<String>,
        /// Read the payload from a file instead
        #[arg(long, conflicts_with = "data")]
        file: Option<PathBuf>,
    },
    /// Lease the next ready job
    Lease,
    /// Acknowledge a leased job, removing it for good
    Ack {
        /// Job id
        id: u64,
    },
    /// Give a leased job back to the queue
    Nack {
        /// Job id
        id: u64,
    },
    /// Print the number of ready jobs
    Len,
    /// Check that the daemon is answering
    Ping,
    /// Submit and drain many jobs concurrently, verifying each arrives once
    Stress(stress::StressArgs),
}

#[derive(Serialize)]
struct Submitted {
    id: JobId,
}

#[derive(Serialize)]
struct Leased {
    id: JobId,
    bytes: usize,
    payload: String,
}

#[derive(Serialize)]
struct Settled {
    id: JobId,
}

#[derive(Serialize)]
struct Length {
    length: u64,
}

#[derive(Serialize)]
struct Pong {
    pong: bool,
}

pub async fn handle(command: Command, client: &QueueClient, format: OutputFormat) -> Result<()> {
    match command {
        Command::Submit { data, file } => {
            let payload = match file {
                Some(path) => std::fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => data.unwrap_or_default().into_bytes(),
            };
            let id = client.submit(payload).await?;
            print_result(format, &Submitted { id }, |s| format!("Submitted job {}", s.id))?;
        }
        Command::Lease => {
            let Some((id, payload)) = client.lease().await? else {
                return Err(ExitError::rejected("Queue is empty").into());
            };
            let leased = Leased { id, bytes: payload.len(), payload: payload_text(&payload) };
            print_result(format, &leased, |l| {
                format!("Leased job {} ({} bytes)\n{}", l.id, l.bytes, l.payload)
            })?;
        }
        Command::Ack { id } => {
            let id = JobId(id);
            if !client.ack(id).await? {
                return Err(ExitError::rejected(format!("Job {} is not leased", id)).into());
            }
            print_result(format, &Settled { id }, |s| format!("Acknowledged job {}", s.id))?;
        }
        Command::Nack { id } => {
            let id = JobId(id);
            if !client.nack(id).await? {
                return Err(ExitError::rejected(format!("Job {} is not leased", id)).into());
            }
            print_result(format, &Settled { id }, |s| format!("Released job {}", s.id))?;
        }
        Command::Len => {
            let length = client.length().await?;
            print_result(format, &Length { length }, |l| l.length.to_string())?;
        }
        Command::Ping => {
            client.ping().await?;
            print_result(format, &Pong { pong: true }, |_| "pong".to_string())?;
        }
        Command::Stress(args) => stress::handle(args, client, format).await?,
    }
    Ok(())
}
