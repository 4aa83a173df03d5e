//! Binds the exporter lifecycle to the metrics server.

use std::future::Future;
use std::sync::Arc;

use prometheus::Registry;
use tracing::{info, warn};

use hyperlane_base::{ExporterMetrics, Server};
use hyperlane_core::ChainClient;

use crate::exporter::{ExporterError, HyperlaneContractExporter};
use crate::settings::ExporterSettings;

/// Run the exporter for `chain` with `settings` until `shutdown` resolves.
///
/// The listen address is bound first, then the network is resolved and one
/// checkpoint is fetched before the server starts answering scrapes. Any
/// failure up to that point closes `chain` and is returned.
pub async fn run<F>(
    settings: &ExporterSettings,
    chain: Arc<dyn ChainClient>,
    shutdown: F,
) -> Result<(), ExporterError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics = match ExporterMetrics::new(Registry::new()) {
        Ok(metrics) => Arc::new(metrics),
        Err(err) => {
            chain.close().await;
            return Err(err.into());
        }
    };
    let server = match Server::bind(&settings.host, settings.port, metrics.clone()).await {
        Ok(server) => server,
        Err(err) => {
            warn!(host = %settings.host, port = settings.port, error = %err, "Failed to bind metrics server");
            chain.close().await;
            return Err(err.into());
        }
    };
    let exporter = HyperlaneContractExporter::new(chain, metrics, settings.interval);
    run_with_server(server, exporter, shutdown).await
}

/// Run `exporter` behind an already bound `server` until `shutdown` resolves.
pub async fn run_with_server<F>(
    server: Server,
    exporter: HyperlaneContractExporter,
    shutdown: F,
) -> Result<(), ExporterError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Err(err) = start(&exporter).await {
        exporter.stop().await;
        return Err(err);
    }

    let served = server.serve(shutdown).await;
    exporter.stop().await;
    served.map_err(Into::into)
}

async fn start(exporter: &HyperlaneContractExporter) -> Result<(), ExporterError> {
    exporter.init().await?;
    let index = exporter.tick().await?;
    info!(index, "Fetched initial checkpoint");
    exporter.start()
}

/// Resolves on SIGINT or SIGTERM (Ctrl-C outside unix).
pub async fn shutdown_signal() {
    let signal = wait_for_signal().await;
    info!(signal, "Received shutdown signal");
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "Failed to register signal handlers, falling back to Ctrl-C");
                return wait_for_ctrl_c().await;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for Ctrl-C, only an external kill stops the exporter");
        std::future::pending::<()>().await;
    }
    "Ctrl-C"
}
