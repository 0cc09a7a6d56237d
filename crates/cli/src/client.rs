// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue client: one TCP connection per request.

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tw_core::{JobId, Payload};
use tw_wire::{self as wire, IdWidth, ProtocolError, Request, Response, Status};

/// Errors talking to the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("daemon rejected request: {0}")]
    Rejected(Status),

    #[error("unexpected response: {0:?}")]
    UnexpectedResponse(Response),

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ClientError {
    /// Whether the daemon never saw or never answered the request.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            ClientError::Connect { .. } | ClientError::ConnectTimeout(_) => true,
            ClientError::Protocol(e) => matches!(
                e,
                ProtocolError::ConnectionClosed | ProtocolError::Timeout | ProtocolError::Io(_)
            ),
            ClientError::Rejected(_)
            | ClientError::UnexpectedResponse(_)
            | ClientError::Worker(_) => false,
        }
    }
}

/// Client for the taxiway daemon.
#[derive(Debug, Clone)]
pub struct QueueClient {
    addr: String,
    id_width: IdWidth,
    timeout: Duration,
}

impl QueueClient {
    pub fn new(addr: impl Into<String>, id_width: IdWidth, timeout: Duration) -> Self {
        Self { addr: addr.into(), id_width, timeout }
    }

    /// Open a connection, send one request, and read its response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| ClientError::ConnectTimeout(self.addr.clone()))?
            .map_err(|source| ClientError::Connect { addr: self.addr.clone(), source })?;
        let (mut reader, mut writer) = stream.into_split();

        wire::write_request(&mut writer, request, self.timeout).await?;
        let response =
            wire::read_response(&mut reader, request.opcode(), self.id_width, self.timeout).await?;

        match response {
            Response::Error(status) => Err(ClientError::Rejected(status)),
            other => Ok(other),
        }
    }

    pub async fn submit(&self, payload: Vec<u8>) -> Result<JobId, ClientError> {
        match self.send(&Request::Submit { payload }).await? {
            Response::Submitted { id } => Ok(id),
            other => Err(ClientError::UnexpectedResponse(other)),
        }
    }

    /// Lease the next job, or `None` if the queue is empty.
    pub async fn lease(&self) -> Result<Option<(JobId, Payload)>, ClientError> {
        match self.send(&Request::Lease).await? {
            Response::Leased { id, payload } => Ok(Some((id, payload))),
            Response::QueueEmpty => Ok(None),
            other => Err(ClientError::UnexpectedResponse(other)),
        }
    }

    /// Returns false if the job was unknown or not leased.
    pub async fn ack(&self, id: JobId) -> Result<bool, ClientError> {
        self.settle(Request::Ack { id }).await
    }

    /// Returns false if the job was unknown or not leased.
    pub async fn nack(&self, id: JobId) -> Result<bool, ClientError> {
        self.settle(Request::Nack { id }).await
    }

    async fn settle(&self, request: Request) -> Result<bool, ClientError> {
        match self.send(&request).await? {
            Response::Ok => Ok(true),
            Response::Failed => Ok(false),
            other => Err(ClientError::UnexpectedResponse(other)),
        }
    }

    pub async fn length(&self) -> Result<u64, ClientError> {
        match self.send(&Request::Length).await? {
            Response::Length(n) => Ok(n),
            other => Err(ClientError::UnexpectedResponse(other)),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(ClientError::UnexpectedResponse(other)),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
