// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Visibility timeout specs: unacknowledged leases come back.

use crate::prelude::*;
use serial_test::serial;
use std::time::Duration;

fn short_leases() -> Server {
    Server::start_with(|config| {
        config.queue.visibility_timeout = Duration::from_millis(200);
        config.reaper_interval = Duration::from_millis(20);
    })
}

#[test]
#[serial]
fn unacked_job_is_redelivered_with_same_id_and_payload() {
    let server = short_leases();
    server.submit(b"retry me");
    let (id, _) = server.lease().unwrap();
    assert_eq!(server.length(), 0);

    assert!(wait_for(SPEC_WAIT_MAX_MS, || server.length() == 1), "lease never expired");
    assert_eq!(server.lease(), Some((id, b"retry me".to_vec())));
}

#[test]
#[serial]
fn stale_ack_after_redelivery_fails() {
    let server = short_leases();
    server.submit(b"job");
    let (id, _) = server.lease().unwrap();

    assert!(wait_for(SPEC_WAIT_MAX_MS, || server.length() == 1));
    assert_eq!(server.ack(id), 1);

    // The new holder can still finish it
    let (again, _) = server.lease().unwrap();
    assert_eq!(again, id);
    assert_eq!(server.ack(id), 0);
}

#[test]
#[serial]
fn acked_job_never_returns() {
    let server = short_leases();
    server.submit(b"done");
    let (id, _) = server.lease().unwrap();
    assert_eq!(server.ack(id), 0);

    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(server.length(), 0);
    assert_eq!(server.lease(), None);
}

#[test]
#[serial]
fn expired_job_rejoins_behind_waiting_jobs() {
    let server = short_leases();
    server.submit(b"a");
    let (first, _) = server.lease().unwrap();
    server.submit(b"b");

    assert!(wait_for(SPEC_WAIT_MAX_MS, || server.length() == 2));
    assert_eq!(server.lease().map(|(id, _)| id), Some(1));
    assert_eq!(server.lease().map(|(id, _)| id), Some(first));
}

#[test]
#[serial]
fn live_lease_is_not_redelivered() {
    let server = Server::start_with(|config| {
        config.queue.visibility_timeout = Duration::from_secs(30);
        config.reaper_interval = Duration::from_millis(10);
    });
    server.submit(b"held");
    server.lease().unwrap();

    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(server.length(), 0);
    assert_eq!(server.lease(), None);
}
