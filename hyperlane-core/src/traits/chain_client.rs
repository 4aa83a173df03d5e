use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{Abi, ChainResult, H160, U256};

/// Interface to the RPC endpoint of a single EVM chain.
///
/// An implementation owns one session (connection pool) which is created
/// once and shared by every concurrent caller until `close` is called.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait ChainClient: Send + Sync + Debug {
    /// The chain id reported by the endpoint.
    async fn chain_id(&self) -> ChainResult<u64>;

    /// Call the zero-argument, read-only function `function_name` described
    /// by `abi` on the contract at `contract_address`, at the latest block.
    ///
    /// Returns the trailing unsigned integer output of the function.
    async fn call_read_function(
        &self,
        contract_address: H160,
        abi: &Abi,
        function_name: &str,
    ) -> ChainResult<U256>;

    /// Release the session. Calls made afterwards fail with
    /// `ChainCommunicationError::ClientClosed`. Closing twice is a no-op.
    async fn close(&self);
}
