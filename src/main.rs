//! Command-line front end: flags in, summary lines out.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use pushbench::{Pacing, RampController, Result, RunConfig, TcpConnect, DEFAULT_RAMPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Self-paced sessions: each pings as fast as its pongs come back.
    Echo,
    /// Externally-paced sessions: a shared pacer targets an aggregate rate.
    Driven,
}

/// Load-test a push-messaging echo/broadcast server across a concurrency ramp.
#[derive(Debug, Parser)]
#[command(name = "pushbench", version, about)]
struct Args {
    /// Remote endpoint, host:port.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Worker threads for the runtime.
    #[arg(short = 'n', long, default_value_t = 1)]
    cores: usize,

    /// Comma-separated concurrency levels, ascending.
    #[arg(long, value_delimiter = ',')]
    ramps: Option<Vec<usize>>,

    /// Send cadence mode.
    #[arg(long, value_enum, default_value_t = Mode::Echo)]
    mode: Mode,

    /// Per-session duration in seconds (echo mode).
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,

    /// Target aggregate message rate in messages/second (driven mode).
    #[arg(long, default_value_t = 1000)]
    rate: u32,

    /// Total message budget per level (driven mode).
    #[arg(long, default_value_t = 10_000)]
    total: u64,

    /// Pause between ramp levels in seconds.
    #[arg(long, default_value_t = 5)]
    settle_secs: u64,

    /// Connect + handshake bound per session in seconds.
    #[arg(long, default_value_t = 30)]
    connect_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> RunConfig {
        let pacing = match self.mode {
            Mode::Echo => Pacing::SelfPaced {
                session_duration: Duration::from_secs(self.duration_secs),
            },
            Mode::Driven => Pacing::Driven {
                rate: self.rate,
                total_messages: self.total,
            },
        };
        RunConfig {
            ramps: self.ramps.unwrap_or_else(|| DEFAULT_RAMPS.to_vec()),
            pacing,
            settle_delay: Duration::from_secs(self.settle_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            worker_threads: self.cores,
        }
    }
}

fn run(addr: SocketAddr, config: RunConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let controller = RampController::new(TcpConnect::new(addr), config)?;
        controller.run_with(|ramp| println!("{ramp}")).await;
        Ok(())
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let addr = args.addr;
    if let Err(err) = run(addr, args.into_config()) {
        eprintln!("pushbench: {err}");
        std::process::exit(1);
    }
}
