// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async framing over any `AsyncRead`/`AsyncWrite` pair.
//!
//! Reads are exact-sized: a request or response is decoded by reading
//! precisely the bytes its opcode calls for, never by reading to EOF.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tw_core::{JobId, Payload};

use crate::{IdWidth, Opcode, Request, Response, Status};

/// Errors from reading or writing protocol frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed mid-frame")]
    ConnectionClosed,

    #[error("timed out")]
    Timeout,

    #[error("connection closed before an opcode was sent")]
    EmptyRequest,

    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    #[error("payload of {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("unknown status byte {0}")]
    UnknownStatus(u8),

    #[error("job id {id} does not fit in {width} bytes")]
    IdOutOfRange { id: JobId, width: IdWidth },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    /// The status reply owed to the client, if the request was malformed in a
    /// way the server answers rather than silently dropping.
    pub fn reply(&self) -> Option<Response> {
        match self {
            ProtocolError::EmptyRequest => Some(Response::Error(Status::EmptyRequest)),
            ProtocolError::UnknownOpcode(_) => Some(Response::Error(Status::InvalidOpcode)),
            ProtocolError::PayloadTooLarge { .. } => Some(Response::Error(Status::PayloadTooLarge)),
            _ => None,
        }
    }
}

async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, ProtocolError>
where
    F: std::future::Future<Output = Result<T, ProtocolError>>,
{
    tokio::time::timeout(timeout, fut).await.map_err(|_| ProtocolError::Timeout)?
}

async fn read_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ProtocolError::ConnectionClosed),
        Err(e) => Err(e.into()),
    }
}

async fn read_u8<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u8, ProtocolError> {
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf).await?;
    Ok(buf[0])
}

async fn read_u32<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32, ProtocolError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf).await?;
    Ok(u32::from_be_bytes(buf))
}

async fn read_u64<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u64, ProtocolError> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf).await?;
    Ok(u64::from_be_bytes(buf))
}

async fn read_body<R: AsyncRead + Unpin>(reader: &mut R, len: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut payload = vec![0u8; len];
    read_exact(reader, &mut payload).await?;
    Ok(payload)
}

async fn write_all<W>(writer: &mut W, bytes: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one request from a client.
///
/// A SUBMIT whose declared length exceeds `max_payload` fails with
/// [`ProtocolError::PayloadTooLarge`] before any payload byte is read.
pub async fn read_request<R>(
    reader: &mut R,
    max_payload: usize,
    timeout: Duration,
) -> Result<Request, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    with_timeout(timeout, read_request_frame(reader, max_payload)).await
}

async fn read_request_frame<R>(reader: &mut R, max_payload: usize) -> Result<Request, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut first = [0u8; 1];
    if reader.read(&mut first).await? == 0 {
        return Err(ProtocolError::EmptyRequest);
    }
    let opcode = Opcode::try_from(first[0]).map_err(ProtocolError::UnknownOpcode)?;

    let request = match opcode {
        Opcode::Submit => {
            let len = read_u32(reader).await? as usize;
            if len > max_payload {
                return Err(ProtocolError::PayloadTooLarge { len, max: max_payload });
            }
            Request::Submit { payload: read_body(reader, len).await? }
        }
        Opcode::Lease => Request::Lease,
        Opcode::Ack => Request::Ack { id: JobId(read_u64(reader).await?) },
        Opcode::Nack => Request::Nack { id: JobId(read_u64(reader).await?) },
        Opcode::Length => Request::Length,
        Opcode::Ping => Request::Ping,
    };
    Ok(request)
}

/// Write one response to a client.
pub async fn write_response<W>(
    writer: &mut W,
    response: &Response,
    width: IdWidth,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = response.encode(width)?;
    with_timeout(timeout, write_all(writer, &bytes)).await
}

/// Write one request to the server.
pub async fn write_request<W>(
    writer: &mut W,
    request: &Request,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = request.encode().ok_or_else(|| match request {
        Request::Submit { payload } => {
            ProtocolError::PayloadTooLarge { len: payload.len(), max: u32::MAX as usize }
        }
        _ => ProtocolError::ConnectionClosed,
    })?;
    with_timeout(timeout, write_all(writer, &bytes)).await
}

/// Read the server's response to a request with the given opcode.
///
/// `width` must match the server's configured SUBMIT id width.
pub async fn read_response<R>(
    reader: &mut R,
    opcode: Opcode,
    width: IdWidth,
    timeout: Duration,
) -> Result<Response, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    with_timeout(timeout, read_response_frame(reader, opcode, width)).await
}

async fn read_response_frame<R>(
    reader: &mut R,
    opcode: Opcode,
    width: IdWidth,
) -> Result<Response, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    if opcode == Opcode::Length {
        return Ok(Response::Length(read_u64(reader).await?));
    }

    let byte = read_u8(reader).await?;
    let status = Status::try_from(byte).map_err(ProtocolError::UnknownStatus)?;

    let response = match (opcode, status) {
        (Opcode::Submit, Status::Ok) => {
            let id = match width {
                IdWidth::Narrow => u64::from(read_u32(reader).await?),
                IdWidth::Wide => read_u64(reader).await?,
            };
            Response::Submitted { id: JobId(id) }
        }
        (Opcode::Lease, Status::Ok) => {
            let id = JobId(read_u64(reader).await?);
            let len = read_u32(reader).await? as usize;
            let payload: Payload = read_body(reader, len).await?.into();
            Response::Leased { id, payload }
        }
        (Opcode::Lease, Status::Failed) => Response::QueueEmpty,
        (Opcode::Ack | Opcode::Nack, Status::Ok) => Response::Ok,
        (Opcode::Ack | Opcode::Nack, Status::Failed) => Response::Failed,
        (Opcode::Ping, Status::Pong) => Response::Pong,
        (_, status) => Response::Error(status),
    };
    Ok(response)
}
