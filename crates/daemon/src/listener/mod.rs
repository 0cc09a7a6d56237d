// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener accepts TCP connections and hands each one to its own task.
//! A connection carries exactly one request and one response, then closes.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use tw_core::{JobQueue, QueueError};
use tw_wire::{self as wire, IdWidth, ProtocolError, Request, Response, Status};

/// Shared context for all connection handlers.
pub(crate) struct ListenCtx {
    pub queue: Arc<JobQueue>,
    pub id_width: IdWidth,
    pub ipc_timeout: Duration,
    pub max_payload_bytes: usize,
}

/// Listener task for accepting socket connections.
pub(crate) struct Listener {
    tcp: TcpListener,
    ctx: Arc<ListenCtx>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub fn new(
        tcp: TcpListener,
        ctx: Arc<ListenCtx>,
        cancel: CancellationToken,
        tasks: TaskTracker,
    ) -> Self {
        Self { tcp, ctx, cancel, tasks }
    }

    /// Run the accept loop until cancelled, spawning a task per connection.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Listener stopped accepting connections");
                    return;
                }
                result = self.tcp.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("TCP connection from {}", addr);
                            let ctx = Arc::clone(&self.ctx);
                            self.tasks.spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("TCP accept error: {}", e),
                    }
                }
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected mid-request")
        }
        ConnectionError::Protocol(ProtocolError::EmptyRequest) => {
            debug!("Client closed without sending a request")
        }
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("Connection timeout"),
        ConnectionError::Protocol(
            ProtocolError::UnknownOpcode(_) | ProtocolError::PayloadTooLarge { .. },
        ) => warn!("Rejected request: {}", e),
        _ => error!("Connection error: {}", e),
    }
}

/// Serve one request on a connection.
///
/// Malformed requests that still deserve an answer (empty request, unknown
/// opcode, oversize payload) get a best-effort status byte before the error
/// is returned. A request cut off mid-body gets nothing.
async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request =
        match wire::read_request(&mut reader, ctx.max_payload_bytes, ctx.ipc_timeout).await {
            Ok(request) => request,
            Err(e) => {
                if let Some(reply) = e.reply() {
                    let _ =
                        wire::write_response(&mut writer, &reply, ctx.id_width, ctx.ipc_timeout)
                            .await;
                    let unread = match e {
                        ProtocolError::PayloadTooLarge { len, .. } => len as u64,
                        _ => ctx.max_payload_bytes as u64,
                    };
                    let _ = writer.shutdown().await;
                    discard_unread(&mut reader, unread, ctx.ipc_timeout).await;
                }
                return Err(e.into());
            }
        };

    debug!(opcode = %request.opcode(), "received request");
    let response = handle_request(request, &ctx.queue);
    debug!("Sending response: {:?}", response);

    wire::write_response(&mut writer, &response, ctx.id_width, ctx.ipc_timeout).await?;
    Ok(())
}

/// Drain up to `limit` bytes the client already sent.
///
/// Closing a TCP socket with unread input resets the connection, which can
/// destroy the status byte before the client reads it.
async fn discard_unread<R: AsyncRead + Unpin>(reader: &mut R, limit: u64, timeout: Duration) {
    let mut rest = reader.take(limit);
    let _ = tokio::time::timeout(timeout, tokio::io::copy(&mut rest, &mut tokio::io::sink())).await;
}

/// Apply a request to the queue and build its response.
fn handle_request(request: Request, queue: &JobQueue) -> Response {
    match request {
        Request::Submit { payload } => {
            let len = payload.len();
            match queue.submit(payload) {
                Ok(id) => {
                    debug!(job = %id, bytes = len, "submitted");
                    Response::Submitted { id }
                }
                Err(QueueError::PayloadTooLarge { .. }) => {
                    Response::Error(Status::PayloadTooLarge)
                }
                Err(e @ QueueError::IdSpaceExhausted { .. }) => {
                    warn!("{}", e);
                    Response::Error(Status::IdSpaceExhausted)
                }
                Err(QueueError::UnknownOrNotLeased(_)) => Response::Failed,
            }
        }
        Request::Lease => match queue.lease() {
            Some(job) => {
                debug!(job = %job.id, "leased");
                Response::Leased { id: job.id, payload: job.payload }
            }
            None => Response::QueueEmpty,
        },
        Request::Ack { id } => match queue.ack(id) {
            Ok(_) => {
                debug!(job = %id, "acked");
                Response::Ok
            }
            Err(e) => {
                debug!("ack refused: {}", e);
                Response::Failed
            }
        },
        Request::Nack { id } => match queue.release(id) {
            Ok(()) => {
                debug!(job = %id, "released");
                Response::Ok
            }
            Err(e) => {
                debug!("nack refused: {}", e);
                Response::Failed
            }
        },
        Request::Length => Response::Length(queue.length()),
        Request::Ping => Response::Pong,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
