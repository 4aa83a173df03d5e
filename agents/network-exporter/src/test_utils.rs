use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use hyperlane_core::{Abi, ChainClient, ChainCommunicationError, ChainResult, H160, U256};

mockall::mock! {
    pub ChainClient {}

    #[async_trait]
    impl ChainClient for ChainClient {
        async fn chain_id(&self) -> ChainResult<u64>;
        async fn call_read_function(
            &self,
            contract_address: H160,
            abi: &Abi,
            function_name: &str,
        ) -> ChainResult<U256>;
        async fn close(&self);
    }
}

impl Debug for MockChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MockChainClient")
    }
}

/// One scripted answer to `call_read_function`.
#[derive(Debug)]
pub struct ScriptedCall {
    delay: Duration,
    result: Result<U256, &'static str>,
}

impl ScriptedCall {
    pub fn ok(value: u64) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(U256::from(value)),
        }
    }

    pub fn err(message: &'static str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message),
        }
    }

    /// Answer only after `delay` has elapsed.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A chain client answering contract calls from a script, in call order.
///
/// The script entry is taken when the call starts, so calls that overlap
/// still receive their answers in the order they were issued.
#[derive(Debug)]
pub struct ScriptedChainClient {
    chain_id: u64,
    script: Mutex<VecDeque<ScriptedCall>>,
    calls: Mutex<Vec<(H160, String)>>,
    closes: AtomicUsize,
    pub closed: AtomicBool,
}

impl ScriptedChainClient {
    pub fn new(chain_id: u64, script: impl IntoIterator<Item = ScriptedCall>) -> Self {
        Self {
            chain_id,
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Every `call_read_function` received so far.
    pub fn calls(&self) -> Vec<(H160, String)> {
        self.calls.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for ScriptedChainClient {
    async fn chain_id(&self) -> ChainResult<u64> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChainCommunicationError::ClientClosed);
        }
        Ok(self.chain_id)
    }

    async fn call_read_function(
        &self,
        contract_address: H160,
        _abi: &Abi,
        function_name: &str,
    ) -> ChainResult<U256> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChainCommunicationError::ClientClosed);
        }
        self.calls
            .lock()
            .push((contract_address, function_name.to_owned()));
        let next = self.script.lock().pop_front();
        let Some(ScriptedCall { delay, result }) = next else {
            return Err(ChainCommunicationError::from_transport_str(
                "script exhausted",
            ));
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result.map_err(ChainCommunicationError::from_transport_str)
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}
