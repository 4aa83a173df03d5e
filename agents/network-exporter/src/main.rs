//! Hyperlane network exporter binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr};

use hyperlane_ethereum::EthereumChainClient;
use network_exporter::{
    app,
    settings::{ExporterArgs, ExporterSettings},
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let settings: ExporterSettings = ExporterArgs::parse().into();
    settings
        .tracing
        .start_tracing()
        .wrap_err("Failed to start tracing")?;
    tracing::info!(
        host = %settings.host,
        port = settings.port,
        interval_ms = settings.interval.as_millis() as u64,
        "Network exporter starting up"
    );

    let chain = EthereumChainClient::new(settings.ethereum_rpc.clone(), settings.rpc_timeout)
        .wrap_err("Failed to build Ethereum RPC client")?;
    app::run(&settings, Arc::new(chain), app::shutdown_signal())
        .await
        .wrap_err("Network exporter failed")
}
