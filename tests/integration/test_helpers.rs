// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use chatfleet::config::Config;
use chatfleet::core::protocol::replies::NAME_PROMPT;
use chatfleet::core::state::ChatState;
use chatfleet::server;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, UdpSocket};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// How long a read may block before a test fails.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}

/// A chat server on an ephemeral loopback port, with a UDP socket standing in
/// for the supervisor's collector.
pub struct TestServer {
    pub state: Arc<ChatState>,
    pub addr: SocketAddr,
    pub collector: UdpSocket,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Starts a server after letting the caller adjust the test configuration.
    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        init_tracing();
        let collector = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind the test collector");

        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.telemetry.collector_addr = collector.local_addr().unwrap().to_string();
        config.telemetry.interval = Duration::from_millis(100);
        customize(&mut config);

        let ctx = server::setup(config, 0)
            .await
            .expect("Failed to set up the chat server");
        let addr = ctx.local_addr().unwrap();
        let state = ctx.state.clone();
        let handle = tokio::spawn(server::serve(ctx));

        Self {
            state,
            addr,
            collector,
            handle,
        }
    }

    /// Waits until exactly `count` users are in the directory.
    pub async fn wait_for_users(&self, count: usize) {
        let state = self.state.clone();
        eventually(move || {
            let state = state.clone();
            async move { state.directory.len().await == count }
        })
        .await;
    }

    /// Connects and joins as `name`, returning once the server has registered the user.
    pub async fn join(&self, name: &str) -> TestClient {
        let before = self.state.directory.len().await;
        let mut client = TestClient::connect(self.addr).await;
        client.send_line(name).await;
        self.wait_for_users(before + 1).await;
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Polls `check` until it holds, failing the test after `READ_TIMEOUT`.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + READ_TIMEOUT;
    while !check().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within {:?}",
            READ_TIMEOUT
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A line-oriented chat client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    /// Connects and consumes the name prompt.
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr)
            .await
            .expect("Failed to connect to the chat server");
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
        };
        let mut prompt = vec![0u8; NAME_PROMPT.len()];
        tokio::time::timeout(READ_TIMEOUT, client.reader.read_exact(&mut prompt))
            .await
            .expect("Timed out waiting for the name prompt")
            .unwrap();
        assert_eq!(prompt, NAME_PROMPT.as_bytes());
        client
    }

    pub async fn send_line(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Writes raw bytes, for input that is not valid text.
    pub async fn send_bytes(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Reads one line including its `\n`. Returns an empty string at EOF.
    pub async fn read_line(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(READ_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("Timed out waiting for a line")
            .unwrap();
        line
    }

    pub async fn read_lines(&mut self, count: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            lines.push(self.read_line().await);
        }
        lines
    }

    /// Asserts that nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        let mut line = String::new();
        let res =
            tokio::time::timeout(Duration::from_millis(150), self.reader.read_line(&mut line))
                .await;
        assert!(res.is_err(), "expected no data but received {line:?}");
    }

    pub async fn expect_eof(&mut self) {
        assert_eq!(self.read_line().await, "");
    }
}
