use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::TransactionRequest;
use parking_lot::RwLock;
use tracing::{debug, instrument};
use url::Url;

use hyperlane_core::{Abi, ChainClient, ChainCommunicationError, ChainResult, H160, U256};

use super::categorize_provider_error;

/// Error produced while interpreting the output of a contract call.
#[derive(Debug, thiserror::Error)]
pub enum EthereumCallError {
    /// The function has no unsigned integer output
    #[error("Function `{0}` returned no unsigned integer output")]
    NoNumericOutput(String),
}

/// A `ChainClient` talking JSON-RPC over HTTP to a single Ethereum node.
///
/// One `reqwest::Client` (and therefore one connection pool) backs every call
/// made through this client until it is closed.
pub struct EthereumChainClient {
    url: Url,
    provider: RwLock<Option<Arc<Provider<Http>>>>,
}

impl EthereumChainClient {
    /// Create a client for the node at `url`. Every request is bounded by
    /// `timeout`.
    pub fn new(url: Url, timeout: Duration) -> ChainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ChainCommunicationError::from_transport)?;
        let provider = Provider::new(Http::new_with_client(url.clone(), client));
        Ok(Self {
            url,
            provider: RwLock::new(Some(Arc::new(provider))),
        })
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.provider.read().is_none()
    }

    fn provider(&self) -> ChainResult<Arc<Provider<Http>>> {
        self.provider
            .read()
            .clone()
            .ok_or(ChainCommunicationError::ClientClosed)
    }
}

impl Debug for EthereumChainClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // the url may embed an API key
        f.debug_struct("EthereumChainClient")
            .field("host", &self.url.host_str())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl ChainClient for EthereumChainClient {
    #[instrument(level = "debug", skip(self), err)]
    async fn chain_id(&self) -> ChainResult<u64> {
        let chain_id = self
            .provider()?
            .get_chainid()
            .await
            .map_err(|err| categorize_provider_error("eth_chainId", err))?;
        if chain_id > U256::from(u64::MAX) {
            return Err(ChainCommunicationError::from_transport_str(
                "eth_chainId returned a value that does not fit in u64",
            ));
        }
        Ok(chain_id.as_u64())
    }

    #[instrument(level = "debug", skip(self, abi), err)]
    async fn call_read_function(
        &self,
        contract_address: H160,
        abi: &Abi,
        function_name: &str,
    ) -> ChainResult<U256> {
        let provider = self.provider()?;
        let function = abi
            .function(function_name)
            .map_err(|err| ChainCommunicationError::from_contract_error(function_name, err))?;
        let data = function
            .encode_input(&[])
            .map_err(|err| ChainCommunicationError::from_contract_error(function_name, err))?;

        let tx = TransactionRequest::new().to(contract_address).data(data);
        let output = provider
            .call(&tx.into(), None)
            .await
            .map_err(|err| categorize_provider_error(function_name, err))?;

        let tokens = function
            .decode_output(&output)
            .map_err(|err| ChainCommunicationError::from_contract_error(function_name, err))?;
        let value = trailing_uint(&tokens).ok_or_else(|| {
            ChainCommunicationError::from_contract_error(
                function_name,
                EthereumCallError::NoNumericOutput(function_name.to_owned()),
            )
        })?;
        debug!(function = function_name, %value, "Contract call returned");
        Ok(value)
    }

    async fn close(&self) {
        if self.provider.write().take().is_some() {
            debug!(host = ?self.url.host_str(), "Closed ethereum chain client");
        }
    }
}

/// The last unsigned integer among the decoded outputs of a call.
pub fn trailing_uint(tokens: &[Token]) -> Option<U256> {
    tokens.iter().rev().find_map(|token| match token {
        Token::Uint(value) => Some(*value),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use axum::{routing::post, Json, Router};
    use ethers::abi::Token;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use crate::{LATEST_CHECKPOINT_FUNCTION, MERKLE_TREE_HOOK_ABI};

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn unreachable_client() -> EthereumChainClient {
        EthereumChainClient::new("http://127.0.0.1:1".parse().unwrap(), TIMEOUT).unwrap()
    }

    /// Serve a fake JSON-RPC node answering every request with `respond`.
    async fn fake_node(respond: fn(&str) -> Value) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/",
            post(move |Json(request): Json<Value>| async move {
                let method = request["method"].as_str().unwrap_or_default().to_owned();
                let mut response = respond(&method);
                response["jsonrpc"] = json!("2.0");
                response["id"] = request["id"].clone();
                Json(response)
            }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/").parse().unwrap()
    }

    fn healthy_node(method: &str) -> Value {
        match method {
            "eth_chainId" => json!({ "result": "0x4268" }),
            "eth_call" => {
                let output = ethers::abi::encode(&[
                    Token::FixedBytes(vec![0xab; 32]),
                    Token::Uint(U256::from(12345)),
                ]);
                json!({ "result": format!("0x{}", ethers::utils::hex::encode(output)) })
            }
            _ => json!({ "error": { "code": -32601, "message": "method not found" } }),
        }
    }

    fn reverting_node(_method: &str) -> Value {
        json!({ "error": { "code": 3, "message": "execution reverted" } })
    }

    #[test]
    fn trailing_uint_picks_the_last_numeric_output() {
        let tokens = vec![
            Token::Uint(U256::from(1)),
            Token::FixedBytes(vec![0; 32]),
            Token::Uint(U256::from(7)),
        ];
        assert_eq!(trailing_uint(&tokens), Some(U256::from(7)));
        assert_eq!(trailing_uint(&[Token::FixedBytes(vec![0; 32])]), None);
        assert_eq!(trailing_uint(&[]), None);
    }

    #[tokio::test]
    async fn reads_chain_id_and_latest_checkpoint() {
        let client = EthereumChainClient::new(fake_node(healthy_node).await, TIMEOUT).unwrap();
        assert_eq!(client.chain_id().await.unwrap(), 17000);

        let index = client
            .call_read_function(H160::zero(), &MERKLE_TREE_HOOK_ABI, LATEST_CHECKPOINT_FUNCTION)
            .await
            .unwrap();
        assert_eq!(index, U256::from(12345));
    }

    #[tokio::test]
    async fn json_rpc_error_is_a_contract_call_error() {
        let client = EthereumChainClient::new(fake_node(reverting_node).await, TIMEOUT).unwrap();
        let err = client
            .call_read_function(H160::zero(), &MERKLE_TREE_HOOK_ABI, LATEST_CHECKPOINT_FUNCTION)
            .await
            .unwrap_err();
        assert!(err.is_contract_call(), "{err:?}");
        assert!(err.to_string().contains(LATEST_CHECKPOINT_FUNCTION));
    }

    #[tokio::test]
    async fn output_without_number_is_a_contract_call_error() {
        let client = EthereumChainClient::new(fake_node(healthy_node).await, TIMEOUT).unwrap();
        let err = client
            .call_read_function(H160::zero(), &MERKLE_TREE_HOOK_ABI, "root")
            .await
            .unwrap_err();
        assert!(err.is_contract_call(), "{err:?}");
    }

    #[tokio::test]
    async fn unknown_function_is_a_contract_call_error() {
        let err = unreachable_client()
            .call_read_function(H160::zero(), &MERKLE_TREE_HOOK_ABI, "latestCheckpoints")
            .await
            .unwrap_err();
        assert!(err.is_contract_call(), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let err = unreachable_client().chain_id().await.unwrap_err();
        assert!(err.is_transport(), "{err:?}");
    }

    #[test]
    fn debug_shows_only_the_host() {
        let client = EthereumChainClient::new(
            "https://rpc.example.com/v2/secret-key".parse().unwrap(),
            TIMEOUT,
        )
        .unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("rpc.example.com"), "{debug}");
        assert!(!debug.contains("secret-key"), "{debug}");
        assert!(debug.contains("closed: false"), "{debug}");
    }

    #[tokio::test]
    async fn closed_client_refuses_calls() {
        let client = unreachable_client();
        client.close().await;
        client.close().await;
        assert!(client.is_closed());
        assert!(matches!(
            client.chain_id().await,
            Err(ChainCommunicationError::ClientClosed)
        ));
        assert!(matches!(
            client
                .call_read_function(H160::zero(), &MERKLE_TREE_HOOK_ABI, LATEST_CHECKPOINT_FUNCTION)
                .await,
            Err(ChainCommunicationError::ClientClosed)
        ));
    }
}
