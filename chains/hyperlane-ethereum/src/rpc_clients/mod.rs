use ethers::providers::{ProviderError, RpcError};
use hyperlane_core::ChainCommunicationError;
use tracing::{trace, warn};

pub use self::provider::*;

mod provider;

/// Figure out whether a provider failure happened on the way to the contract
/// or in the contract call itself.
///
/// A JSON-RPC error response (revert, bad call data, ...) means the node
/// executed the call and is attributed to `function`. Everything else
/// (connection, HTTP status, malformed envelope) is a transport error.
///
/// Caller is responsible for adding a log span with additional context.
fn categorize_provider_error(function: &str, err: ProviderError) -> ChainCommunicationError {
    match err.as_error_response() {
        Some(response) => {
            warn!(error = %response, function, "JsonRpcError in http provider");
            ChainCommunicationError::from_contract_error(function, err)
        }
        None => {
            trace!(error = %err, "Transport error in http provider");
            ChainCommunicationError::from_transport(err)
        }
    }
}
