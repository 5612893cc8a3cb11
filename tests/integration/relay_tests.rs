//! Integration tests for byte fidelity and cycle behavior of the two
//! relay variants, using in-memory endpoints and local streams.

use std::collections::VecDeque;

use super::test_helpers::{BrokenConn, FakeEndpointFactory};
use stdrelay::bridge::relay::{InwardRelay, OutwardRelay};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::sync::CancellationToken;

/// Bytes a client writes to an inward endpoint appear on the local sink
/// in order and unmodified (the `--out p2` scenario).
#[tokio::test]
async fn inward_relay_delivers_client_bytes_to_local_sink() {
    let (mut client, conn) = tokio::io::duplex(64);
    let (sink, mut local_read) = tokio::io::duplex(64);
    let (factory, stats) = FakeEndpointFactory::new(vec![conn]);
    let mut sinks = VecDeque::from(vec![sink]);
    let cancel = CancellationToken::new();

    let relay = InwardRelay::new("p2", factory, move || {
        sinks.pop_front().expect("one sink per cycle")
    });
    let handle = tokio::spawn(relay.run(cancel.clone()));

    client.write_all(b"world\n").await.expect("client write");
    drop(client);

    let mut received = Vec::new();
    local_read
        .read_to_end(&mut received)
        .await
        .expect("read local sink");
    assert_eq!(received, b"world\n");

    cancel.cancel();
    handle.await.expect("join").expect("relay run");
    assert_eq!(
        stats.binds(),
        stats.drops(),
        "every endpoint must be disposed exactly once"
    );
}

/// Bytes the local source produces appear at the client in order and
/// unmodified (the `--in p1` scenario).
#[tokio::test]
async fn outward_relay_delivers_local_bytes_to_client() {
    let (conn, mut client) = tokio::io::duplex(64);
    let (mut local_write, source) = tokio::io::duplex(64);
    let (factory, stats) = FakeEndpointFactory::new(vec![conn]);
    let mut sources = VecDeque::from(vec![source]);
    let cancel = CancellationToken::new();

    let relay = OutwardRelay::new("p1", factory, move || {
        sources.pop_front().expect("one source per cycle")
    });
    let handle = tokio::spawn(relay.run(cancel.clone()));

    local_write.write_all(b"hello\n").await.expect("local write");
    drop(local_write);

    let mut received = Vec::new();
    client
        .read_to_end(&mut received)
        .await
        .expect("client read");
    assert_eq!(received, b"hello\n");

    cancel.cancel();
    handle.await.expect("join").expect("relay run");
    assert_eq!(stats.binds(), stats.drops());
}

/// After a client disconnects, the bridge binds a fresh endpoint and
/// serves the next client; the old endpoint is disposed.
#[tokio::test]
async fn inward_relay_accepts_next_client_after_disconnect() {
    let (mut client1, conn1) = tokio::io::duplex(64);
    let (mut client2, conn2) = tokio::io::duplex(64);
    let (sink1, mut local_read1) = tokio::io::duplex(64);
    let (sink2, mut local_read2) = tokio::io::duplex(64);
    let (factory, stats) = FakeEndpointFactory::new(vec![conn1, conn2]);
    let mut sinks = VecDeque::from(vec![sink1, sink2]);
    let cancel = CancellationToken::new();

    let relay = InwardRelay::new("reconnect", factory, move || {
        sinks.pop_front().expect("one sink per cycle")
    });
    let handle = tokio::spawn(relay.run(cancel.clone()));

    client1.write_all(b"first").await.expect("client1 write");
    drop(client1);
    let mut received = Vec::new();
    local_read1
        .read_to_end(&mut received)
        .await
        .expect("read first sink");
    assert_eq!(received, b"first");

    client2.write_all(b"second").await.expect("client2 write");
    drop(client2);
    received.clear();
    local_read2
        .read_to_end(&mut received)
        .await
        .expect("read second sink");
    assert_eq!(received, b"second");

    cancel.cancel();
    handle.await.expect("join").expect("relay run");
    assert!(stats.binds() >= 2, "expected a fresh endpoint per cycle");
    assert_eq!(
        stats.binds(),
        stats.drops(),
        "every endpoint must be disposed exactly once"
    );
}

/// A connection that fails mid-relay is non-fatal: the bridge logs the
/// cycle failure and binds a fresh endpoint for the next client.
#[tokio::test]
async fn inward_relay_retries_after_transient_connection_failure() {
    let (factory, stats) = FakeEndpointFactory::new(vec![BrokenConn]);
    let cancel = CancellationToken::new();

    let relay = InwardRelay::new("flaky", factory, || tokio::io::duplex(8).0);
    let handle = tokio::spawn(relay.run(cancel.clone()));

    // The failed cycle ends in a paced retry; wait for the rebind.
    for _ in 0..100 {
        if stats.binds() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(stats.binds() >= 2, "bridge must rebind after a failure");

    cancel.cancel();
    handle.await.expect("join").expect("relay must not die");
    assert_eq!(stats.binds(), stats.drops());
}

/// An outward relay whose source hits EOF ends the cycle cleanly and
/// republishes for the next client.
#[tokio::test]
async fn outward_relay_source_eof_closes_client_connection() {
    let (conn, mut client) = tokio::io::duplex(64);
    let (factory, stats) = FakeEndpointFactory::new(vec![conn]);
    let mut sources: VecDeque<DuplexStream> = VecDeque::new();
    sources.push_back({
        let (write, read) = tokio::io::duplex(8);
        drop(write); // source is at EOF from the start
        read
    });
    let cancel = CancellationToken::new();

    let relay = OutwardRelay::new("eof", factory, move || {
        sources.pop_front().expect("one source per cycle")
    });
    let handle = tokio::spawn(relay.run(cancel.clone()));

    let mut received = Vec::new();
    client
        .read_to_end(&mut received)
        .await
        .expect("client read");
    assert!(received.is_empty(), "no bytes should reach the client");

    cancel.cancel();
    handle.await.expect("join").expect("relay run");
    assert_eq!(stats.binds(), stats.drops());
}
