// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for specs: an in-process daemon and a raw-socket client.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use tokio::runtime::Runtime;
use tw_daemon::{startup, Config, Daemon};

pub use std::sync::Arc;
pub use tw_wire::IdWidth;

/// Upper bound for polling waits.
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Poll `check` until it returns true or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    check()
}

/// A daemon on an ephemeral port, served by its own runtime threads.
pub struct Server {
    rt: Runtime,
    daemon: Option<Daemon>,
    pub addr: SocketAddr,
}

impl Server {
    pub fn start() -> Self {
        Self::start_with(|_| {})
    }

    pub fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
        let mut config = Config::with_addr("127.0.0.1:0");
        configure(&mut config);
        let rt = Runtime::new().unwrap();
        let daemon = rt.block_on(startup(config)).unwrap();
        let addr = daemon.local_addr();
        Self { rt, daemon: Some(daemon), addr }
    }

    /// Send raw bytes on a fresh connection and return everything the server
    /// writes before closing it.
    pub fn request(&self, bytes: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream.write_all(bytes).unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).unwrap();
        reply
    }

    /// Like `request`, but closes the write half first so the server sees EOF.
    pub fn request_then_close(&self, bytes: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream.write_all(bytes).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();
        let mut reply = Vec::new();
        let _ = stream.read_to_end(&mut reply);
        reply
    }

    /// SUBMIT; returns the 4-byte id.
    pub fn submit(&self, payload: &[u8]) -> u32 {
        let reply = self.request(&submit_frame(payload));
        assert_eq!(reply.len(), 5, "submit reply: {reply:?}");
        assert_eq!(reply[0], 0);
        u32::from_be_bytes(reply[1..5].try_into().unwrap())
    }

    /// LEASE; returns `(id, payload)` or `None` on status 1.
    pub fn lease(&self) -> Option<(u64, Vec<u8>)> {
        let reply = self.request(&[2]);
        match reply[0] {
            0 => {
                let id = u64::from_be_bytes(reply[1..9].try_into().unwrap());
                let len = u32::from_be_bytes(reply[9..13].try_into().unwrap()) as usize;
                assert_eq!(reply.len(), 13 + len, "lease reply: {reply:?}");
                Some((id, reply[13..].to_vec()))
            }
            1 => {
                assert_eq!(reply.len(), 1);
                None
            }
            other => panic!("unexpected lease status {other}"),
        }
    }

    /// ACK; returns the status byte.
    pub fn ack(&self, id: u64) -> u8 {
        self.status(&id_frame(3, id))
    }

    /// NACK; returns the status byte.
    pub fn nack(&self, id: u64) -> u8 {
        self.status(&id_frame(4, id))
    }

    /// LENGTH; the reply is a bare u64.
    pub fn length(&self) -> u64 {
        let reply = self.request(&[5]);
        u64::from_be_bytes(reply.as_slice().try_into().unwrap())
    }

    fn status(&self, bytes: &[u8]) -> u8 {
        let reply = self.request(bytes);
        assert_eq!(reply.len(), 1, "reply: {reply:?}");
        reply[0]
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(daemon) = self.daemon.take() {
            let _ = self.rt.block_on(daemon.shutdown());
        }
    }
}

pub fn submit_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![1];
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

pub fn id_frame(opcode: u8, id: u64) -> Vec<u8> {
    let mut frame = vec![opcode];
    frame.extend_from_slice(&id.to_be_bytes());
    frame
}
