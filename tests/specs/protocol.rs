// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-level request/response specs for every opcode.

use crate::prelude::*;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

#[test]
fn ping_answers_sixty_nine() {
    let server = Server::start();
    assert_eq!(server.request(&[6]), vec![69]);
}

#[test]
fn submit_ids_start_at_zero_and_increase() {
    let server = Server::start();
    assert_eq!(server.submit(b"a"), 0);
    assert_eq!(server.submit(b"b"), 1);
    assert_eq!(server.submit(b"c"), 2);
    assert_eq!(server.length(), 3);
}

#[test]
fn lease_returns_oldest_job_with_eight_byte_id() {
    let server = Server::start();
    server.submit(b"first");
    server.submit(b"second");

    assert_eq!(server.lease(), Some((0, b"first".to_vec())));
    assert_eq!(server.lease(), Some((1, b"second".to_vec())));
    assert_eq!(server.lease(), None);
}

#[test]
fn ack_succeeds_once() {
    let server = Server::start();
    server.submit(b"job");
    let (id, _) = server.lease().unwrap();

    assert_eq!(server.ack(id), 0);
    assert_eq!(server.ack(id), 1);
    assert_eq!(server.length(), 0);
    assert_eq!(server.lease(), None);
}

#[test]
fn ack_of_ready_or_unknown_job_fails() {
    let server = Server::start();
    server.submit(b"never leased");
    assert_eq!(server.ack(0), 1);
    assert_eq!(server.ack(12345), 1);
    assert_eq!(server.length(), 1);
}

#[test]
fn nack_requeues_at_tail() {
    let server = Server::start();
    server.submit(b"a");
    server.submit(b"b");
    let (id, _) = server.lease().unwrap();

    assert_eq!(server.nack(id), 0);
    assert_eq!(server.nack(id), 1);
    assert_eq!(server.lease(), Some((1, b"b".to_vec())));
    assert_eq!(server.lease(), Some((0, b"a".to_vec())));
}

#[test]
fn length_excludes_leased_jobs() {
    let server = Server::start();
    for payload in [b"1", b"2", b"3"] {
        server.submit(payload);
    }
    server.lease().unwrap();

    let reply = server.request(&[5]);
    assert_eq!(reply, 2u64.to_be_bytes().to_vec());
}

#[test]
fn empty_payload_is_accepted() {
    let server = Server::start();
    assert_eq!(server.submit(b""), 0);
    assert_eq!(server.lease(), Some((0, Vec::new())));
}

#[test]
fn binary_payload_survives_intact() {
    let server = Server::start();
    let payload: Vec<u8> = (0..=255).collect();
    server.submit(&payload);
    assert_eq!(server.lease().unwrap().1, payload);
}

#[test]
fn invalid_opcode_answers_two() {
    let server = Server::start();
    assert_eq!(server.request_then_close(&[0]), vec![2]);
    assert_eq!(server.request_then_close(&[42]), vec![2]);
    assert_eq!(server.length(), 0);
}

#[test]
fn empty_request_answers_three() {
    let server = Server::start();
    assert_eq!(server.request_then_close(&[]), vec![3]);
}

#[test]
fn oversize_payload_answers_four_and_consumes_no_id() {
    let server = Server::start_with(|config| config.queue.max_payload_bytes = 8);

    assert_eq!(server.request(&submit_frame(&[7; 9])), vec![4]);
    assert_eq!(server.length(), 0);
    assert_eq!(server.submit(&[7; 8]), 0);
}

#[test]
fn oversize_declared_length_is_rejected_without_the_body() {
    let server = Server::start_with(|config| config.queue.max_payload_bytes = 8);

    // Header only: a 4 GiB declaration must not make the server wait for the body
    let reply = server.request_then_close(&[1, 0xff, 0xff, 0xff, 0xff]);
    assert_eq!(reply, vec![4]);
}

#[test]
fn truncated_request_gets_no_reply_and_changes_nothing() {
    let server = Server::start();

    assert!(server.request_then_close(&[1, 0, 0, 0, 10, b'x']).is_empty());
    assert!(server.request_then_close(&[3, 0, 0]).is_empty());
    assert_eq!(server.length(), 0);
    assert_eq!(server.submit(b"next"), 0);
}

#[test]
fn stalled_client_is_dropped_after_timeout() {
    let server = Server::start_with(|config| config.ipc_timeout = Duration::from_millis(100));

    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(&[1, 0, 0]).unwrap();

    let mut reply = Vec::new();
    let _ = stream.read_to_end(&mut reply);
    assert!(reply.is_empty());
    assert_eq!(server.length(), 0);
}

#[test]
fn wide_id_width_sends_eight_byte_submit_ids() {
    let server = Server::start_with(|config| {
        config.id_width = IdWidth::Wide;
        config.queue.max_job_id = IdWidth::Wide.max_id();
    });

    assert_eq!(server.request(&submit_frame(b"x")), vec![0, 0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn exhausted_id_space_answers_five() {
    let server = Server::start_with(|config| config.queue.max_job_id = 1);

    assert_eq!(server.submit(b"a"), 0);
    assert_eq!(server.submit(b"b"), 1);
    assert_eq!(server.request(&submit_frame(b"c")), vec![5]);
    assert_eq!(server.length(), 2);
}
