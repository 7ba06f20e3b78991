//! chanlease CLI Client
//!
//! Command-line interface for inspecting and driving channel leadership.

use std::thread;
use std::time::{Duration, Instant};

use chanlease::protocol::{Command, Reply};
use chanlease::{
    Config, Context, LeaderManager, LeadershipId, RemoteExecutor, Result, StoreLeaderManager,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// chanlease CLI
#[derive(Parser, Debug)]
#[command(name = "chanlease-cli")]
#[command(about = "CLI for chanlease channel leadership")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7420")]
    server: String,

    /// Key prefix isolating this leadership domain
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Lease TTL in milliseconds
    #[arg(long, default_value = "10000")]
    ttl_ms: u64,

    /// Deadline for each store call in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Become leader of a channel, or learn the current leader
    Acquire {
        channel: String,

        /// Node ID to register as leader
        node: String,

        /// Leadership token to offer (generated if omitted)
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Show the current leader of a channel
    Inspect { channel: String },

    /// Extend a lease held with the given token
    Refresh { channel: String, token: String },

    /// Give up a lease held with the given token
    Release { channel: String, token: String },

    /// Show the remaining lease lifetime of a channel
    Ttl { channel: String },

    /// Acquire a channel, keep it refreshed, then release it
    Hold {
        channel: String,

        node: String,

        /// How long to hold leadership, in seconds
        #[arg(long, default_value = "30")]
        seconds: u64,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .store_addr(&args.server)
        .key_prefix(&args.prefix)
        .lease_ttl(Duration::from_millis(args.ttl_ms))
        .io_timeout_ms(args.timeout_ms)
        .build();
    config.validate()?;

    let timeout = Duration::from_millis(args.timeout_ms);
    let ctx = || Context::with_timeout(timeout);
    let manager = StoreLeaderManager::from_config(RemoteExecutor::from_config(&config), &config)?;

    match args.command {
        Commands::Ping => {
            if manager.executor().ping(&ctx())? {
                println!("PONG");
            }
        }
        Commands::Acquire {
            channel,
            node,
            token,
        } => {
            let token = token.unwrap_or_else(|| LeadershipId::generate().into_string());
            let leader = manager.acquire_or_inspect(&ctx(), &channel, &node, &token)?;
            let status = if leader.leadership_id == token {
                "acquired"
            } else {
                "held by other"
            };
            println!("{} {} {}", status, leader.node_id, leader.leadership_id);
        }
        Commands::Inspect { channel } => match manager.inspect(&ctx(), &channel)? {
            Some(leader) => println!("{} {}", leader.node_id, leader.leadership_id),
            None => println!("(no leader)"),
        },
        Commands::Refresh { channel, token } => {
            println!("{}", manager.refresh(&ctx(), &channel, &token)?);
        }
        Commands::Release { channel, token } => {
            println!("{}", manager.release(&ctx(), &channel, &token)?);
        }
        Commands::Ttl { channel } => {
            let key = manager.namespace().key(&channel);
            match manager.executor().call(&ctx(), &Command::Ttl { key })? {
                Reply::Integer(-2) => println!("(no leader)"),
                Reply::Integer(-1) => println!("(no expiry)"),
                Reply::Integer(ms) => println!("{}ms", ms),
                other => println!("unexpected reply: {:?}", other),
            }
        }
        Commands::Hold {
            channel,
            node,
            seconds,
        } => hold(&manager, timeout, &channel, &node, Duration::from_secs(seconds))?,
    }

    Ok(())
}

/// Acquire, refresh every third of the TTL, release at the end.
/// Returns as soon as a refresh reports the lease lost.
fn hold(
    manager: &StoreLeaderManager<RemoteExecutor>,
    timeout: Duration,
    channel: &str,
    node: &str,
    duration: Duration,
) -> Result<()> {
    let token = LeadershipId::generate();
    let leader =
        manager.acquire_or_inspect(&Context::with_timeout(timeout), channel, node, token.as_str())?;
    if leader.leadership_id != token.as_str() {
        println!("held by other {} {}", leader.node_id, leader.leadership_id);
        return Ok(());
    }
    println!("acquired {} {}", leader.node_id, token);

    let interval = manager.ttl() / 3;
    let until = Instant::now() + duration;

    loop {
        let now = Instant::now();
        if now >= until {
            break;
        }
        thread::sleep(interval.min(until - now));

        if !manager.refresh(&Context::with_timeout(timeout), channel, token.as_str())? {
            println!("lost");
            return Ok(());
        }
        tracing::debug!(channel, "Lease refreshed");
    }

    let released = manager.release(&Context::with_timeout(timeout), channel, token.as_str())?;
    println!("released {}", released);
    Ok(())
}
