// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Many clients at once: ids stay unique, jobs are delivered once.

use crate::prelude::*;
use std::collections::HashSet;
use std::sync::Mutex;
use std::thread;

#[test]
fn concurrent_submitters_get_unique_ids() {
    let server = Arc::new(Server::start());
    let submitters = 64;
    let per_submitter = 20;

    let handles: Vec<_> = (0..submitters)
        .map(|n| {
            let server = Arc::clone(&server);
            thread::spawn(move || {
                (0..per_submitter)
                    .map(|seq| server.submit(format!("{n}:{seq}").as_bytes()))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(ids.insert(id), "duplicate id {id}");
        }
    }

    let total = submitters * per_submitter;
    assert_eq!(ids.len(), total);
    assert_eq!(server.length(), total as u64);
}

#[test]
fn concurrent_drain_delivers_each_job_once() {
    let server = Arc::new(Server::start());
    let total = 500;
    for n in 0..total {
        server.submit(format!("job-{n}").as_bytes());
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let server = Arc::clone(&server);
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                while let Some((id, payload)) = server.lease() {
                    assert_eq!(payload, format!("job-{id}").into_bytes());
                    assert_eq!(server.ack(id), 0);
                    seen.lock().unwrap().push(id);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    let unique: HashSet<_> = seen.iter().copied().collect();
    assert_eq!(seen.len(), total);
    assert_eq!(unique.len(), total);
    assert_eq!(server.length(), 0);
}

#[test]
fn length_tracks_submitted_minus_leased() {
    let server = Server::start();
    for n in 0..10u8 {
        server.submit(&[n]);
    }
    for leased in 1..=4 {
        server.lease().unwrap();
        assert_eq!(server.length(), 10 - leased);
    }
}
