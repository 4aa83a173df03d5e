//! Polling loop and lifecycle of the checkpoint exporter.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::{
    sync::watch,
    task::{JoinHandle, JoinSet},
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use hyperlane_base::ExporterMetrics;
use hyperlane_core::{
    ChainClient, ChainCommunicationError, HyperlaneProtocolError, KnownNetwork,
    UnsupportedNetworkError, H160, U256,
};
use hyperlane_ethereum::{LATEST_CHECKPOINT_FUNCTION, MERKLE_TREE_HOOK_ABI};

/// Errors raised by the exporter lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// The RPC endpoint serves a chain with no known MerkleTreeHook
    #[error(transparent)]
    UnsupportedNetwork(#[from] UnsupportedNetworkError),
    /// Talking to the chain failed
    #[error(transparent)]
    Chain(#[from] ChainCommunicationError),
    /// The network registry is inconsistent
    #[error(transparent)]
    Protocol(#[from] HyperlaneProtocolError),
    /// The metrics could not be registered
    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
    /// The HTTP server failed
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
    /// `init` has not completed yet
    #[error("Exporter is not initialized")]
    NotInitialized,
    /// `init` was already called
    #[error("Exporter is already initialized")]
    AlreadyInitialized,
    /// The exporter is stopping or stopped
    #[error("Exporter is stopped")]
    Stopped,
}

/// The checkpoint index returned by the contract is above the gauge range.
#[derive(Debug, thiserror::Error)]
#[error("Checkpoint index {0} does not fit in an i64 gauge")]
pub struct CheckpointOutOfRange(pub U256);

/// Lifecycle of a [`HyperlaneContractExporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterState {
    /// Constructed, network unknown
    Created,
    /// Network resolved, loop not running
    Initialized,
    /// Loop running
    Running,
    /// `stop` in progress
    Stopping,
    /// Loop finished and chain client closed
    Stopped,
}

/// Polls the MerkleTreeHook `latestCheckpoint()` of the network served by the
/// chain client and publishes it to the `hyperlane_contract_latest_checkpoint`
/// gauge.
///
/// The loop spawns one tick every `interval` without waiting for earlier
/// ticks, so slow RPC calls can overlap. Every tick writes the gauge once,
/// after its call returns, so the last tick to complete wins.
pub struct HyperlaneContractExporter {
    chain: Arc<dyn ChainClient>,
    metrics: Arc<ExporterMetrics>,
    interval: Duration,
    network: OnceLock<KnownNetwork>,
    state: watch::Sender<ExporterState>,
    cancel: CancellationToken,
    poll_loop: Mutex<Option<PollLoop>>,
}

struct PollLoop {
    handle: JoinHandle<()>,
    stopped: watch::Receiver<bool>,
}

impl HyperlaneContractExporter {
    /// Create an exporter polling `chain` every `interval`.
    pub fn new(chain: Arc<dyn ChainClient>, metrics: Arc<ExporterMetrics>, interval: Duration) -> Self {
        Self {
            chain,
            metrics,
            interval,
            network: OnceLock::new(),
            state: watch::Sender::new(ExporterState::Created),
            cancel: CancellationToken::new(),
            poll_loop: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExporterState {
        *self.state.borrow()
    }

    /// The network resolved by `init`.
    pub fn network(&self) -> Option<KnownNetwork> {
        self.network.get().copied()
    }

    /// Ask the chain client which network it serves and remember it.
    pub async fn init(&self) -> Result<KnownNetwork, ExporterError> {
        if self.state() != ExporterState::Created {
            return Err(ExporterError::AlreadyInitialized);
        }

        let chain_id = self.chain.chain_id().await?;
        let network = KnownNetwork::try_from(chain_id)?;
        // fail before publishing anything if the registry entry is broken
        network.merkle_tree_hook_address()?;

        let initialized = self.state.send_if_modified(|state| {
            if *state != ExporterState::Created || self.network.set(network).is_err() {
                return false;
            }
            *state = ExporterState::Initialized;
            true
        });
        if !initialized {
            return Err(ExporterError::AlreadyInitialized);
        }
        info!(%network, chain_id, "Discovered Ethereum network");
        Ok(network)
    }

    /// Fetch the latest checkpoint once and publish it. Returns the published
    /// index.
    ///
    /// Must not run concurrently with [`Self::stop`]: only ticks spawned by
    /// the loop are drained, so a direct tick racing `stop` may still publish
    /// after the chain client is closed, or fail with `ClientClosed`.
    pub async fn tick(&self) -> Result<i64, ExporterError> {
        match self.state() {
            ExporterState::Created => return Err(ExporterError::NotInitialized),
            ExporterState::Stopping | ExporterState::Stopped => {
                return Err(ExporterError::Stopped)
            }
            ExporterState::Initialized | ExporterState::Running => {}
        }
        self.ticker()?.tick().await
    }

    /// Launch the polling loop in the background. Starting a running exporter
    /// is a no-op.
    pub fn start(&self) -> Result<(), ExporterError> {
        let mut started = Ok(false);
        self.state.send_if_modified(|state| {
            started = match *state {
                ExporterState::Created => Err(ExporterError::NotInitialized),
                ExporterState::Running => Ok(false),
                ExporterState::Stopping | ExporterState::Stopped => Err(ExporterError::Stopped),
                ExporterState::Initialized => self.spawn_loop().map(|()| true),
            };
            if matches!(started, Ok(true)) {
                *state = ExporterState::Running;
                return true;
            }
            false
        });

        if started? {
            info!(interval_ms = self.interval.as_millis() as u64, "Exporter started");
        }
        Ok(())
    }

    fn spawn_loop(&self) -> Result<(), ExporterError> {
        let ticker = self.ticker()?;
        let (stopped_tx, stopped) = watch::channel(false);
        let span = info_span!("ExporterLoop", network = %ticker.network);
        let handle = tokio::spawn(
            poll_loop(ticker, self.interval, self.cancel.clone(), stopped_tx).instrument(span),
        );
        *self.poll_loop.lock() = Some(PollLoop { handle, stopped });
        Ok(())
    }

    /// Cancel the loop, wait for it and every in-flight tick to finish, then
    /// close the chain client.
    ///
    /// Every caller returns only once the exporter is `Stopped`; a call made
    /// while another `stop` is draining waits for it instead of closing the
    /// client again.
    pub async fn stop(&self) {
        let mut previous = ExporterState::Stopping;
        self.state.send_if_modified(|state| {
            previous = *state;
            if matches!(*state, ExporterState::Stopping | ExporterState::Stopped) {
                return false;
            }
            *state = ExporterState::Stopping;
            true
        });
        match previous {
            ExporterState::Stopped => return,
            ExporterState::Stopping => {
                // the sender lives in `self`, so the channel outlives this wait
                let _ = self
                    .state
                    .subscribe()
                    .wait_for(|state| *state == ExporterState::Stopped)
                    .await;
                return;
            }
            _ => {}
        }
        self.cancel.cancel();

        let poll_loop = self.poll_loop.lock().take();
        if let Some(PollLoop { handle, mut stopped }) = poll_loop {
            // The sender only goes away after signalling, so an error here
            // means the loop is already gone.
            let _ = stopped.wait_for(|stopped| *stopped).await;
            if let Err(err) = handle.await {
                error!(error = %err, "Exporter loop ended abnormally");
            }
        }

        self.chain.close().await;
        self.state.send_replace(ExporterState::Stopped);
        info!("Exporter stopped");
    }

    fn ticker(&self) -> Result<Ticker, ExporterError> {
        let network = *self.network.get().ok_or(ExporterError::NotInitialized)?;
        Ok(Ticker {
            chain: self.chain.clone(),
            metrics: self.metrics.clone(),
            network,
            contract_address: network.merkle_tree_hook_address()?,
            cancel: self.cancel.clone(),
        })
    }
}

/// Everything a single tick needs, detached from the exporter so that ticks
/// can run as independent tasks.
#[derive(Clone)]
struct Ticker {
    chain: Arc<dyn ChainClient>,
    metrics: Arc<ExporterMetrics>,
    network: KnownNetwork,
    contract_address: H160,
    cancel: CancellationToken,
}

impl Ticker {
    async fn tick(&self) -> Result<i64, ExporterError> {
        let value = self
            .chain
            .call_read_function(
                self.contract_address,
                &MERKLE_TREE_HOOK_ABI,
                LATEST_CHECKPOINT_FUNCTION,
            )
            .await?;
        let index = checkpoint_to_gauge(value)?;

        if self.cancel.is_cancelled() {
            return Err(ExporterError::Stopped);
        }

        let network = self.network;
        if let Some(prev_index) = self.metrics.latest_checkpoint(network) {
            if prev_index > index {
                warn!(
                    %network,
                    prev_index,
                    index,
                    "Fetched a checkpoint index lower than the published one. Did a reorg occur?"
                );
            }
        }
        self.metrics.set_latest_checkpoint(network, index);
        info!(%network, index, "Fetched checkpoint index from contract");
        Ok(index)
    }

    async fn tick_and_log(self) {
        if let Err(err) = self.tick().await {
            match err {
                ExporterError::Stopped => debug!("Dropped checkpoint fetched during shutdown"),
                err => warn!(
                    network = %self.network,
                    operation = LATEST_CHECKPOINT_FUNCTION,
                    error = %err,
                    "Failed to update latest checkpoint"
                ),
            }
        }
    }
}

fn checkpoint_to_gauge(value: U256) -> Result<i64, ExporterError> {
    if value > U256::from(i64::MAX as u64) {
        return Err(ChainCommunicationError::from_contract_error(
            LATEST_CHECKPOINT_FUNCTION,
            CheckpointOutOfRange(value),
        )
        .into());
    }
    Ok(value.as_u64() as i64)
}

/// Marks the loop as finished however its task ends.
struct StoppedSignal(watch::Sender<bool>);

impl Drop for StoppedSignal {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

async fn poll_loop(
    ticker: Ticker,
    interval: Duration,
    cancel: CancellationToken,
    stopped: watch::Sender<bool>,
) {
    let _stopped = StoppedSignal(stopped);
    let mut ticks = JoinSet::new();

    while !cancel.is_cancelled() {
        while let Some(finished) = ticks.try_join_next() {
            if let Err(err) = finished {
                error!(error = %err, "Checkpoint tick panicked");
            }
        }
        if !ticks.is_empty() {
            debug!(in_flight = ticks.len(), "Previous ticks still running");
        }
        ticks.spawn(ticker.clone().tick_and_log().in_current_span());

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }
    }

    ticks.shutdown().await;
    debug!("Exporter loop finished");
}
