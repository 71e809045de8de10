// tests/integration/supervisor_test.rs

//! Drives the supervisor's slot loops, monitor and telemetry tasks end-to-end.

use super::test_helpers::{TestServer, eventually, init_tracing};
use async_trait::async_trait;
use chatfleet::config::Config;
use chatfleet::core::ChatError;
use chatfleet::supervisor::{ChildExit, CommandLauncher, FleetSupervisor, ProcessLauncher};
use std::net::{Ipv4Addr, TcpListener as StdTcpListener};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinSet;

/// Holds the port like a real server would until told to crash.
#[derive(Default)]
struct CrashOnDemand {
    launches: AtomicUsize,
    crash: Notify,
}

#[async_trait]
impl ProcessLauncher for CrashOnDemand {
    async fn run_to_exit(&self, port: u16) -> Result<ChildExit, ChatError> {
        let _listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.crash.notified().await;
        Ok(ChildExit::from_code(1))
    }
}

fn free_port() -> u16 {
    StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.telemetry.collector_addr = "127.0.0.1:0".to_string();
    config.supervisor.probe_host = "127.0.0.1".to_string();
    config.supervisor.retry_delay = Duration::from_millis(50);
    config.supervisor.monitor_period = Duration::from_millis(100);
    config.supervisor.report_period = Duration::from_millis(100);
    config
}

async fn wait_for_launches(launcher: &Arc<CrashOnDemand>, count: usize) {
    let launcher = launcher.clone();
    eventually(move || {
        let launcher = launcher.clone();
        async move { launcher.launches.load(Ordering::SeqCst) >= count }
    })
    .await;
}

#[tokio::test]
async fn test_crashed_server_is_restarted() {
    init_tracing();
    let port = free_port();
    let launcher = Arc::new(CrashOnDemand::default());
    let supervisor = FleetSupervisor::new(fast_config(), &[port], launcher.clone()).unwrap();
    let mut tasks = JoinSet::new();
    supervisor.spawn_all(&mut tasks).await.unwrap();

    wait_for_launches(&launcher, 1).await;
    assert!(StdTcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_err());

    launcher.crash.notify_one();
    wait_for_launches(&launcher, 2).await;

    launcher.crash.notify_one();
    wait_for_launches(&launcher, 3).await;
    tasks.abort_all();
}

#[tokio::test]
async fn test_every_slot_gets_its_own_server() {
    init_tracing();
    let ports = [free_port(), free_port()];
    let launcher = Arc::new(CrashOnDemand::default());
    let supervisor = FleetSupervisor::new(fast_config(), &ports, launcher.clone()).unwrap();
    assert_eq!(
        supervisor
            .slots()
            .iter()
            .map(|s| (s.id, s.port))
            .collect::<Vec<_>>(),
        vec![(1, ports[0]), (2, ports[1])]
    );

    let mut tasks = JoinSet::new();
    supervisor.spawn_all(&mut tasks).await.unwrap();
    wait_for_launches(&launcher, 2).await;
    for port in ports {
        assert!(StdTcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_err());
    }
    tasks.abort_all();
}

#[tokio::test]
async fn test_slot_waits_for_a_busy_port() {
    init_tracing();
    let busy = StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = busy.local_addr().unwrap().port();
    let launcher = Arc::new(CrashOnDemand::default());
    let supervisor = FleetSupervisor::new(fast_config(), &[port], launcher.clone()).unwrap();
    let mut tasks = JoinSet::new();
    supervisor.spawn_all(&mut tasks).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);

    drop(busy);
    wait_for_launches(&launcher, 1).await;
    tasks.abort_all();
}

#[tokio::test]
async fn test_supervisor_collects_telemetry_from_servers() {
    init_tracing();
    let collector_port = free_port();
    let mut config = fast_config();
    config.telemetry.collector_addr = format!("127.0.0.1:{collector_port}");
    config.supervisor.report_period = Duration::from_secs(60);

    let supervisor =
        FleetSupervisor::new(config, &[free_port()], Arc::new(CrashOnDemand::default())).unwrap();
    let queue = supervisor.queue();
    let mut tasks = JoinSet::new();
    supervisor.spawn_all(&mut tasks).await.unwrap();

    let _server = TestServer::with_config(|c| {
        c.telemetry.collector_addr = format!("127.0.0.1:{collector_port}");
    })
    .await;

    let q = queue.clone();
    eventually(move || {
        let q = q.clone();
        async move { q.len() >= 6 }
    })
    .await;
    assert!(queue.drain()[0].starts_with("Servidor en el puerto: "));
    tasks.abort_all();
}

/// Pids of running `chatfleet servidor <port>` processes.
#[cfg(target_os = "linux")]
fn server_pids(port: u16) -> Vec<u32> {
    let wanted = ["servidor".to_string(), port.to_string()];
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let pid: u32 = entry.file_name().to_str()?.parse().ok()?;
            let cmdline = std::fs::read(entry.path().join("cmdline")).ok()?;
            let args: Vec<String> = cmdline
                .split(|b| *b == 0)
                .map(|a| String::from_utf8_lossy(a).into_owned())
                .collect();
            let is_server = args.first()?.ends_with("chatfleet")
                && args.windows(2).any(|w| w == &wanted[..]);
            is_server.then_some(pid)
        })
        .collect()
}

#[cfg(target_os = "linux")]
async fn wait_for_listener(port: u16) {
    eventually(move || async move {
        tokio::net::TcpStream::connect((Ipv4Addr::LOCALHOST, port))
            .await
            .is_ok()
    })
    .await;
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_killed_server_process_is_replaced() {
    init_tracing();
    let port = free_port();
    let launcher = CommandLauncher::new(env!("CARGO_BIN_EXE_chatfleet"));
    let supervisor = FleetSupervisor::new(fast_config(), &[port], Arc::new(launcher)).unwrap();
    let mut tasks = JoinSet::new();
    supervisor.spawn_all(&mut tasks).await.unwrap();

    wait_for_listener(port).await;
    let first = server_pids(port);
    assert_eq!(first.len(), 1, "expected one server process, found {first:?}");

    let killed = Command::new("kill")
        .args(["-9", &first[0].to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let old = first[0];
    eventually(move || async move {
        let pids = server_pids(port);
        pids.len() == 1 && pids[0] != old
    })
    .await;
    wait_for_listener(port).await;

    tasks.abort_all();
    while tasks.join_next().await.is_some() {}
}

#[tokio::test]
async fn test_server_binary_exits_with_failure_on_a_busy_port() {
    let busy = StdTcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
    let port = busy.local_addr().unwrap().port();
    let launcher = CommandLauncher::new(env!("CARGO_BIN_EXE_chatfleet"));
    launcher.check().unwrap();

    let exit = tokio::time::timeout(Duration::from_secs(10), launcher.run_to_exit(port))
        .await
        .expect("the server should exit promptly")
        .unwrap();

    assert_eq!(exit, ChildExit::from_code(1));
}

#[test]
fn test_binary_rejects_bad_invocations() {
    let bin = env!("CARGO_BIN_EXE_chatfleet");
    let status = |args: &[&str]| Command::new(bin).args(args).output().unwrap().status;

    assert_eq!(status(&[]).code(), Some(1));
    assert_eq!(status(&["cliente"]).code(), Some(1));
    assert_eq!(status(&["servidor"]).code(), Some(1));
    assert_eq!(status(&["servidor", "puerto"]).code(), Some(1));
    assert_eq!(status(&["--supervisor", "2", "9000"]).code(), Some(1));
    assert_eq!(status(&["servidor", "9000", "--config"]).code(), Some(1));
}

#[test]
fn test_binary_reports_its_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_chatfleet"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("ChatFleet version "));
}
