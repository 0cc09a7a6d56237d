// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tw_daemon::{startup, Config, Daemon};

async fn daemon_with(max_payload_bytes: usize) -> (Daemon, QueueClient) {
    let mut config = Config::with_addr("127.0.0.1:0");
    config.queue.max_payload_bytes = max_payload_bytes;
    let daemon = startup(config).await.unwrap();
    let client =
        QueueClient::new(daemon.local_addr().to_string(), IdWidth::Narrow, Duration::from_secs(2));
    (daemon, client)
}

#[tokio::test]
async fn submit_lease_ack_round_trip() {
    let (daemon, client) = daemon_with(1024).await;

    client.ping().await.unwrap();
    let id = client.submit(b"payload".to_vec()).await.unwrap();
    assert_eq!(id, JobId(0));
    assert_eq!(client.length().await.unwrap(), 1);

    let (leased, payload) = client.lease().await.unwrap().unwrap();
    assert_eq!(leased, id);
    assert_eq!(&*payload, b"payload");
    assert_eq!(client.length().await.unwrap(), 0);

    assert!(client.ack(id).await.unwrap());
    assert!(!client.ack(id).await.unwrap());
    assert!(client.lease().await.unwrap().is_none());

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn nack_requeues() {
    let (daemon, client) = daemon_with(1024).await;

    let id = client.submit(Vec::new()).await.unwrap();
    client.lease().await.unwrap().unwrap();
    assert!(client.nack(id).await.unwrap());
    assert!(!client.nack(id).await.unwrap());
    assert_eq!(client.length().await.unwrap(), 1);

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn oversize_submit_is_rejected_not_a_connection_failure() {
    let (daemon, client) = daemon_with(4).await;

    let err = client.submit(b"too large".to_vec()).await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected(Status::PayloadTooLarge)), "got {err:?}");
    assert!(!err.is_connection_failure());
    assert_eq!(client.length().await.unwrap(), 0);

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn unreachable_daemon_is_a_connection_failure() {
    // Bind then drop to get a port nothing is listening on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = QueueClient::new(addr.to_string(), IdWidth::Narrow, Duration::from_secs(1));
    let err = client.ping().await.unwrap_err();
    assert!(err.is_connection_failure(), "got {err:?}");
}

#[tokio::test]
async fn panicked_worker_is_an_error_not_a_connection_failure() {
    let joined = tokio::spawn(async { panic!("worker died") }).await;
    let err = ClientError::from(joined.unwrap_err());

    assert!(matches!(err, ClientError::Worker(_)), "got {err:?}");
    assert!(!err.is_connection_failure());
    assert!(err.to_string().starts_with("worker task failed"), "{err}");
}
