//! Exporter configuration, read from the command line with environment
//! fallbacks.

use std::time::Duration;

use clap::Parser;
use url::Url;

use hyperlane_base::settings::{Level, Style, TracingConfig};

/// Command line arguments of the exporter
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hyperlane-network-exporter",
    version,
    about = "Publishes the latest checkpoint of the Hyperlane MerkleTreeHook as a Prometheus gauge",
    long_about = None
)]
pub struct ExporterArgs {
    /// Ethereum JSON-RPC endpoint
    #[arg(long, short = 'e', env = "HYP_EXPORTER_ETHEREUM_RPC")]
    pub ethereum_rpc: Url,

    /// Interval between two checkpoint fetches, in milliseconds
    #[arg(
        long,
        short = 'i',
        env = "HYP_EXPORTER_INTERVAL_MS",
        default_value_t = 30_000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_ms: u64,

    /// Address to serve metrics on
    #[arg(long, short = 'H', env = "HYP_EXPORTER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to serve metrics on
    #[arg(long, short = 'P', env = "HYP_EXPORTER_PORT", default_value_t = 39339)]
    pub port: u16,

    /// Timeout of a single RPC request, in milliseconds
    #[arg(
        long,
        env = "HYP_EXPORTER_RPC_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rpc_timeout_ms: u64,

    /// Most verbose log level
    #[arg(long, env = "HYP_EXPORTER_LOG_LEVEL", value_enum, default_value_t = Level::Info)]
    pub log_level: Level,

    /// Log output style
    #[arg(long, env = "HYP_EXPORTER_LOG_FORMAT", value_enum, default_value_t = Style::Full)]
    pub log_format: Style,
}

/// Settings for the network exporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterSettings {
    /// Ethereum JSON-RPC endpoint
    pub ethereum_rpc: Url,
    /// How frequently to fetch the latest checkpoint
    pub interval: Duration,
    /// Host to bind the metrics server to
    pub host: String,
    /// Port to bind the metrics server to
    pub port: u16,
    /// Timeout of a single RPC request
    pub rpc_timeout: Duration,
    /// Logging configuration
    pub tracing: TracingConfig,
}

impl From<ExporterArgs> for ExporterSettings {
    fn from(args: ExporterArgs) -> Self {
        Self {
            ethereum_rpc: args.ethereum_rpc,
            interval: Duration::from_millis(args.interval_ms),
            host: args.host,
            port: args.port,
            rpc_timeout: Duration::from_millis(args.rpc_timeout_ms),
            tracing: TracingConfig {
                fmt: args.log_format,
                level: args.log_level,
            },
        }
    }
}
