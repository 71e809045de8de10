// src/main.rs

//! The main entry point for the ChatFleet application.

use anyhow::Result;
use chatfleet::config::Config;
use chatfleet::server;
use std::env;
use tracing::{error, info};

const USAGE: &str = "Usage:\n  chatfleet servidor <port> [--config <file>]\n  chatfleet --supervisor <num_servers> <port1> ... <portN> [--config <file>]";

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

/// Removes `--config <file>` from `args` and returns the file, if present.
fn take_config_flag(args: &mut Vec<String>) -> Option<String> {
    let index = args.iter().position(|arg| arg == "--config")?;
    if index + 1 >= args.len() {
        eprintln!("--config flag requires a value");
        std::process::exit(1);
    }
    let path = args.remove(index + 1);
    args.remove(index);
    Some(path)
}

fn usage_error(message: &str) -> ! {
    eprintln!("{message}");
    eprintln!("{USAGE}");
    std::process::exit(1);
}

async fn run_app() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Collect command-line arguments to decide the execution mode.
    let mut args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--version") {
        println!("ChatFleet version {VERSION}");
        return Ok(());
    }

    let config_path = take_config_flag(&mut args);
    let config = match Config::load(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    match args.first().map(String::as_str) {
        Some("--supervisor") => {
            // --- Supervisor Mode ---
            let ports = match chatfleet::supervisor::parse_fleet_args(&args[1..]) {
                Ok(ports) => ports,
                Err(e) => usage_error(&format!("{e:#}")),
            };

            // The supervisor's own module logs at debug by default.
            let log_level = env::var("RUST_LOG").unwrap_or_else(|_| {
                format!("{},chatfleet::core::supervisor=debug", config.log_level)
            });
            init_logging(&log_level);

            info!("Starting ChatFleet in supervisor mode...");
            if let Err(e) = chatfleet::supervisor::run(config, ports, config_path).await {
                error!("Supervisor runtime error: {:#}", e);
                return Err(e);
            }
        }
        Some("servidor") => {
            // --- Chat Server Mode ---
            let port = match args.get(1).map(|p| p.parse::<u16>()) {
                Some(Ok(port)) if args.len() == 2 => port,
                Some(Err(_)) => usage_error(&format!("Invalid port number: {}", args[1])),
                _ => usage_error("servidor mode takes exactly one port"),
            };

            let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
            init_logging(&log_level);

            if let Err(e) = server::run(config, port).await {
                error!("Server runtime error: {:#}", e);
                return Err(e);
            }
        }
        Some("cliente") => usage_error("The interactive client is not part of this build."),
        Some(mode) => usage_error(&format!("Unknown mode: {mode}")),
        None => usage_error("No mode given."),
    }

    Ok(())
}

/// Installs the compact, colored console subscriber.
fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_ansi(true)
        .init();
}
