// tests/integration/telemetry_test.rs

//! Tests the telemetry datagrams from a live chat server to a collector.

use super::test_helpers::{READ_TIMEOUT, TestServer};
use chatfleet::core::telemetry::{TelemetryCollector, TelemetryQueue, TelemetryReporter};
use std::sync::Arc;
use std::time::{Duration, Instant};

async fn next_payload(server: &TestServer) -> String {
    let mut buf = vec![0u8; 2048];
    let (len, _) = tokio::time::timeout(READ_TIMEOUT, server.collector.recv_from(&mut buf))
        .await
        .expect("Timed out waiting for a telemetry datagram")
        .unwrap();
    String::from_utf8(buf[..len].to_vec()).unwrap()
}

fn field<'a>(payload: &'a str, label: &str) -> &'a str {
    payload
        .lines()
        .find_map(|l| l.strip_prefix(label))
        .unwrap_or_else(|| panic!("missing {label:?} in {payload:?}"))
}

fn seconds(value: &str) -> f64 {
    value
        .trim_end_matches(" segundos")
        .parse()
        .unwrap_or_else(|_| panic!("not a number of seconds: {value:?}"))
}

#[tokio::test]
async fn test_server_publishes_a_complete_snapshot() {
    let started = Instant::now();
    let server = TestServer::start().await;

    let payload = next_payload(&server).await;

    assert_eq!(payload.lines().count(), 6);
    assert_eq!(
        field(&payload, "Servidor en el puerto: "),
        server.addr.port().to_string()
    );
    assert_eq!(field(&payload, "Número de usuarios conectados: "), "0");
    let uptime = seconds(field(&payload, "Tiempo de actividad: "));
    assert!(uptime >= 0.0 && uptime <= started.elapsed().as_secs_f64());
}

#[tokio::test]
async fn test_snapshots_track_connected_users() {
    let server = TestServer::start().await;
    let _ana = server.join("ana").await;
    let _beto = server.join("beto").await;

    // Skip any datagram captured before both users joined.
    let deadline = Instant::now() + READ_TIMEOUT;
    loop {
        let payload = next_payload(&server).await;
        if field(&payload, "Número de usuarios conectados: ") == "2" {
            break;
        }
        assert!(Instant::now() < deadline, "user count never reached 2");
    }
}

#[tokio::test]
async fn test_collector_queues_each_published_line() {
    let queue = Arc::new(TelemetryQueue::new());
    let collector = TelemetryCollector::bind("127.0.0.1:0".parse().unwrap(), queue.clone(), 1024)
        .await
        .unwrap();
    let collector_addr = collector.local_addr().unwrap();
    tokio::spawn(collector.run());

    let _server = TestServer::with_config(|c| {
        c.telemetry.collector_addr = collector_addr.to_string();
        c.telemetry.interval = Duration::from_secs(60);
    })
    .await;

    let q = queue.clone();
    super::test_helpers::eventually(move || {
        let q = q.clone();
        async move { q.len() >= 6 }
    })
    .await;

    let reporter = TelemetryReporter::new(queue.clone(), Duration::from_secs(60));
    let lines = reporter.report();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("Servidor en el puerto: "));
    assert!(lines[5].starts_with("Tiempo de actividad: "));
    assert!(queue.is_empty());
}
