use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::anyhow;
use clap::Parser;
use clap_derive::Parser;
use groundstation::channel::lossy::LossyChannel;
use groundstation::channel::udp::UdpChannel;
use groundstation::channel::DatagramChannel;
use groundstation::config::{GroundStationConfig, DEFAULT_SATELLITE_HOST, DEFAULT_SATELLITE_PORT};
use groundstation::console::Console;
use groundstation::exchange::ReliableExchange;
use tokio::io::BufReader;
use tracing::{info, warn, Level};

#[derive(Parser)]
struct Args {
    /// satellite address as host:port
    #[clap(long)]
    satellite: Option<String>,

    #[clap(long, default_value_t = 600)]
    timeout_millis: u64,

    #[clap(long, default_value_t = 5)]
    max_attempts: u32,

    #[clap(long, default_value_t = 50)]
    max_datagram_size: usize,

    /// probability of dropping an outgoing request, for testing
    #[clap(long, default_value_t = 0.0)]
    request_loss: f64,

    /// probability of dropping an incoming reply, for testing
    #[clap(long, default_value_t = 0.0)]
    reply_loss: f64,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,

    #[clap(long, default_value_t = false)]
    very_verbose: bool,
}

async fn resolve(satellite: &str) -> anyhow::Result<SocketAddr> {
    let candidates = tokio::net::lookup_host(satellite).await?
        .collect::<Vec<_>>();

    // 'localhost' often resolves to both ::1 and 127.0.0.1 - prefer IPv4
    candidates.iter()
        .find(|a| a.is_ipv4())
        .or(candidates.first())
        .copied()
        .ok_or_else(|| anyhow!("satellite address {} does not resolve", satellite))
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match (args.verbose, args.very_verbose) {
        (_, true) => Level::TRACE,
        (true, _) => Level::DEBUG,
        (false, false) => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let satellite = args.satellite
        .unwrap_or_else(|| format!("{}:{}", DEFAULT_SATELLITE_HOST, DEFAULT_SATELLITE_PORT));
    let satellite_addr = resolve(&satellite).await?;

    let config = Arc::new(GroundStationConfig {
        receive_timeout: Duration::from_millis(args.timeout_millis),
        max_attempts: args.max_attempts,
        max_datagram_size: args.max_datagram_size,
        ..GroundStationConfig::new(satellite_addr)
    });
    config.validate()?;

    let mut channel: Arc<dyn DatagramChannel> = Arc::new(UdpChannel::bind(config.satellite_addr, config.receive_timeout).await?);
    if args.request_loss > 0.0 || args.reply_loss > 0.0 {
        warn!("simulating packet loss: {} of requests, {} of replies", args.request_loss, args.reply_loss);
        channel = Arc::new(LossyChannel::new(channel, args.request_loss, args.reply_loss)?);
    }

    let mut exchange = ReliableExchange::new(config, channel)?;

    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.run(&mut exchange).await?;

    info!("ground station terminated");
    Ok(())
}
