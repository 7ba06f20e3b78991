//! chanlease Server Binary
//!
//! Runs a lease store over TCP.

use std::sync::Arc;
use std::time::Duration;

use chanlease::network::Server;
use chanlease::{Config, Engine, Reaper};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// chanlease Server
#[derive(Parser, Debug)]
#[command(name = "chanlease-server")]
#[command(about = "Lease store for per-channel leader election")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7420")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Interval between sweeps of expired leases, in milliseconds
    #[arg(short, long, default_value = "100")]
    sweep_ms: u64,

    /// Idle read timeout per connection in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chanlease=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("chanlease Server v{}", chanlease::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .sweep_interval_ms(args.sweep_ms)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let engine = Arc::new(Engine::new());

    let reaper = match Reaper::start(
        Arc::clone(&engine),
        Duration::from_millis(config.sweep_interval_ms),
    ) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to start reaper: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    reaper.stop();
    tracing::info!("Server stopped");
}
