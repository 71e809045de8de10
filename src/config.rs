// src/config.rs

//! Manages configuration for both process modes: loading, defaults and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the telemetry side-channel between chat servers and the supervisor.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TelemetryConfig {
    /// Where chat servers send their datagrams and where the collector listens.
    #[serde(default = "default_collector_addr")]
    pub collector_addr: String,
    /// How often each chat server publishes a snapshot.
    #[serde(with = "humantime_serde", default = "default_publish_interval")]
    pub interval: Duration,
    /// The receive buffer size of the collector. Larger datagrams are truncated.
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            collector_addr: default_collector_addr(),
            interval: default_publish_interval(),
            max_datagram_size: default_max_datagram_size(),
        }
    }
}

impl TelemetryConfig {
    /// Parses `collector_addr` into a socket address.
    pub fn collector_socket_addr(&self) -> Result<SocketAddr> {
        self.collector_addr
            .parse()
            .with_context(|| format!("invalid telemetry collector address '{}'", self.collector_addr))
    }
}

fn default_collector_addr() -> String {
    "127.0.0.1:55555".to_string()
}
fn default_publish_interval() -> Duration {
    Duration::from_secs(5)
}
fn default_max_datagram_size() -> usize {
    1024
}

/// Settings used only in supervisor mode.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SupervisorConfig {
    /// The address a port is probed on before a chat server is launched for it.
    #[serde(default = "default_probe_host")]
    pub probe_host: String,
    /// The chat-server executable. Defaults to the running executable.
    #[serde(default)]
    pub executable: Option<PathBuf>,
    /// Delay after a crash or an unavailable port before the slot tries again.
    #[serde(with = "humantime_serde", default = "default_retry_delay")]
    pub retry_delay: Duration,
    /// How often the monitor re-arms slots that are down.
    #[serde(with = "humantime_serde", default = "default_monitor_period")]
    pub monitor_period: Duration,
    /// How often collected telemetry lines are printed.
    #[serde(with = "humantime_serde", default = "default_report_period")]
    pub report_period: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            probe_host: default_probe_host(),
            executable: None,
            retry_delay: default_retry_delay(),
            monitor_period: default_monitor_period(),
            report_period: default_report_period(),
        }
    }
}

impl SupervisorConfig {
    /// Parses `probe_host` into an IP address.
    pub fn probe_ip(&self) -> Result<IpAddr> {
        self.probe_host
            .parse()
            .with_context(|| format!("invalid probe host '{}'", self.probe_host))
    }
}

fn default_probe_host() -> String {
    "0.0.0.0".to_string()
}
fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}
fn default_monitor_period() -> Duration {
    Duration::from_secs(5)
}
fn default_report_period() -> Duration {
    Duration::from_secs(7)
}

/// Represents the final, validated configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// The interface chat servers listen on.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_backlog")]
    pub backlog: u32,
    /// The longest line a client may send, in bytes. A longer line ends the session.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_backlog() -> u32 {
    128
}
fn default_max_line_length() -> usize {
    1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            log_level: default_log_level(),
            backlog: default_backlog(),
            max_line_length: default_max_line_length(),
            telemetry: TelemetryConfig::default(),
            supervisor: SupervisorConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load configuration from '{path}'"))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at `path` if one is given, otherwise returns the defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        self.host
            .parse::<IpAddr>()
            .with_context(|| format!("host '{}' is not an IP address", self.host))?;
        if self.backlog == 0 {
            return Err(anyhow!("backlog cannot be 0"));
        }
        if self.max_line_length == 0 {
            return Err(anyhow!("max_line_length cannot be 0"));
        }

        self.telemetry.collector_socket_addr()?;
        if self.telemetry.interval.is_zero() {
            return Err(anyhow!("telemetry.interval cannot be 0"));
        }
        if self.telemetry.max_datagram_size == 0 {
            return Err(anyhow!("telemetry.max_datagram_size cannot be 0"));
        }

        self.supervisor.probe_ip()?;
        if self.supervisor.retry_delay.is_zero() {
            return Err(anyhow!("supervisor.retry_delay cannot be 0"));
        }
        if self.supervisor.monitor_period.is_zero() {
            return Err(anyhow!("supervisor.monitor_period cannot be 0"));
        }
        if self.supervisor.report_period.is_zero() {
            return Err(anyhow!("supervisor.report_period cannot be 0"));
        }
        Ok(())
    }
}
