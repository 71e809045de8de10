// src/core/supervisor/mod.rs

//! The fleet supervisor: runs several chat servers as child processes, keeps
//! them alive, and collects the telemetry they push.
//!
//! The supervisor runs as a separate process mode (`--supervisor`) and owns:
//! - One `SlotWorker` per requested port, which probes the port, launches a
//!   chat server and waits for it to exit.
//! - A `FleetMonitor`, the only component that re-arms slots that went down.
//! - A `TelemetryCollector` and a `TelemetryReporter` sharing one queue.

use crate::config::Config;
use crate::core::telemetry::{TelemetryCollector, TelemetryQueue, TelemetryReporter};
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub mod launcher;
pub mod monitor;
pub mod probe;
pub mod slot;

pub use self::launcher::{ChildExit, CommandLauncher, ProcessLauncher};
pub use self::monitor::FleetMonitor;
pub use self::probe::PortProbe;
pub use self::slot::{SlotCommand, SlotEvent, SlotSpec, SlotState, SlotWorker};

/// Capacity of the channel carrying slot state changes to the monitor.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Parses `<num_servers> <port1> ... <portN>` into the list of ports.
pub fn parse_fleet_args(args: &[String]) -> Result<Vec<u16>> {
    let (count, ports) = args
        .split_first()
        .ok_or_else(|| anyhow!("missing number of servers"))?;
    let count: usize = count
        .parse()
        .with_context(|| format!("invalid number of servers '{count}'"))?;
    if count == 0 {
        return Err(anyhow!("the number of servers must be positive"));
    }
    if ports.len() != count {
        return Err(anyhow!(
            "expected {} port(s) but {} were given",
            count,
            ports.len()
        ));
    }
    ports
        .iter()
        .map(|p| {
            p.parse::<u16>()
                .with_context(|| format!("invalid port '{p}'"))
        })
        .collect()
}

/// Owns everything the supervisor's tasks share.
pub struct FleetSupervisor {
    config: Config,
    slots: Vec<SlotSpec>,
    launcher: Arc<dyn ProcessLauncher>,
    probe: PortProbe,
    queue: Arc<TelemetryQueue>,
}

impl FleetSupervisor {
    /// Creates a supervisor with one slot per port. Slot ids start at 1.
    pub fn new(config: Config, ports: &[u16], launcher: Arc<dyn ProcessLauncher>) -> Result<Self> {
        let probe = PortProbe::new(config.supervisor.probe_ip()?);
        let slots = ports
            .iter()
            .enumerate()
            .map(|(i, &port)| SlotSpec { id: i + 1, port })
            .collect();
        Ok(Self {
            config,
            slots,
            launcher,
            probe,
            queue: Arc::new(TelemetryQueue::new()),
        })
    }

    pub fn slots(&self) -> &[SlotSpec] {
        &self.slots
    }

    /// The queue shared by the collector and the reporter.
    pub fn queue(&self) -> Arc<TelemetryQueue> {
        self.queue.clone()
    }

    /// Spawns the slot loops, the monitor and the telemetry tasks into `tasks`.
    pub async fn spawn_all(self, tasks: &mut JoinSet<Result<()>>) -> Result<()> {
        let sup = &self.config.supervisor;
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let mut monitor = FleetMonitor::new(sup.monitor_period, events_rx);

        for &spec in &self.slots {
            let (commands_tx, commands_rx) = mpsc::channel(1);
            monitor.register(spec, commands_tx);
            let worker = SlotWorker::new(
                spec,
                self.launcher.clone(),
                self.probe,
                sup.retry_delay,
                events_tx.clone(),
                commands_rx,
            );
            tasks.spawn(async move {
                worker.run().await;
                Err(anyhow!("Control loop for server {} exited.", spec.id))
            });
        }
        drop(events_tx);

        tasks.spawn(async move {
            monitor.run().await;
            Err(anyhow!("Fleet monitor exited unexpectedly."))
        });

        let collector_addr = self.config.telemetry.collector_socket_addr()?;
        let max_datagram_size = self.config.telemetry.max_datagram_size;
        let queue = self.queue.clone();
        tasks.spawn(async move {
            let collector = TelemetryCollector::bind(collector_addr, queue, max_datagram_size)
                .await
                .context("Telemetry collector could not start")?;
            collector.run().await;
            Err(anyhow!("Telemetry collector exited unexpectedly."))
        });

        let reporter = TelemetryReporter::new(self.queue.clone(), sup.report_period);
        tasks.spawn(async move {
            reporter.run().await;
            Err(anyhow!("Telemetry reporter exited unexpectedly."))
        });

        Ok(())
    }

    /// Runs the supervisor until every task has ended, which in normal
    /// operation never happens.
    pub async fn run(self) -> Result<()> {
        info!(
            "Fleet supervisor starting with {} server(s) on ports {:?}.",
            self.slots.len(),
            self.slots.iter().map(|s| s.port).collect::<Vec<_>>()
        );
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        self.spawn_all(&mut tasks).await?;

        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(Ok(())) => warn!("A supervisor task completed unexpectedly without an error."),
                Ok(Err(e)) => error!("A supervisor task failed: {:#}", e),
                Err(e) => error!("A supervisor task panicked: {}", e),
            }
        }

        Err(anyhow!("All supervisor tasks have terminated. Shutting down."))
    }
}

/// The main entry point for supervisor mode.
pub async fn run(config: Config, ports: Vec<u16>, config_path: Option<String>) -> Result<()> {
    let program = match &config.supervisor.executable {
        Some(path) => path.clone(),
        None => std::env::current_exe().context("Failed to locate the running executable")?,
    };
    let mut launcher = CommandLauncher::new(program);
    if let Some(path) = config_path {
        launcher = launcher.with_config_file(path);
    }
    info!("Chat servers will be launched from {}", launcher.program().display());

    FleetSupervisor::new(config, &ports, Arc::new(launcher))?
        .run()
        .await
}
