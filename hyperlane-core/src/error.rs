use std::any::Any;
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// The result of interacting with a chain.
pub type ChainResult<T> = Result<T, ChainCommunicationError>;

/// An "Any"-typed error.
pub trait HyperlaneCustomError: StdError + Send + Sync + Any {}

impl<E: StdError + Send + Sync + Any> HyperlaneCustomError for E {}

/// Thin wrapper around a boxed HyperlaneCustomError so the chain error enum
/// can carry errors from any transport implementation.
#[repr(transparent)]
pub struct HyperlaneCustomErrorWrapper(Box<dyn HyperlaneCustomError>);

impl Debug for HyperlaneCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", AsRef::<dyn HyperlaneCustomError>::as_ref(&self))
    }
}

impl Display for HyperlaneCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AsRef::<dyn HyperlaneCustomError>::as_ref(&self))
    }
}

impl StdError for HyperlaneCustomErrorWrapper {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl AsRef<dyn HyperlaneCustomError> for HyperlaneCustomErrorWrapper {
    fn as_ref(&self) -> &dyn HyperlaneCustomError {
        self.0.as_ref()
    }
}

impl Deref for HyperlaneCustomErrorWrapper {
    type Target = Box<dyn HyperlaneCustomError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
#[repr(transparent)]
struct StringError(&'static str);

impl Display for StringError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl StdError for StringError {}

/// ChainCommunicationError contains errors returned when attempting to
/// read from a chain
#[derive(Debug, thiserror::Error)]
pub enum ChainCommunicationError {
    /// The RPC endpoint could not be reached, or it answered with something
    /// that is not a valid JSON-RPC response
    #[error("Transport error: {0}")]
    Transport(HyperlaneCustomErrorWrapper),
    /// A read-only contract call reverted, or its ABI did not match what the
    /// contract returned
    #[error("Contract call `{function}` failed: {source}")]
    ContractCall {
        /// Name of the contract function that was called
        function: String,
        /// Underlying failure
        #[source]
        source: HyperlaneCustomErrorWrapper,
    },
    /// The client session has been released and can not serve calls anymore
    #[error("Chain client is closed")]
    ClientClosed,
}

impl ChainCommunicationError {
    /// Create a transport error from any other existing error
    pub fn from_transport<E: HyperlaneCustomError>(err: E) -> Self {
        Self::Transport(HyperlaneCustomErrorWrapper(Box::new(err)))
    }

    /// Create a transport error from a static string
    pub fn from_transport_str(err: &'static str) -> Self {
        Self::from_transport(StringError(err))
    }

    /// Create a contract call error for `function` from any other existing
    /// error
    pub fn from_contract_error<E>(function: impl Into<String>, err: E) -> Self
    where
        E: HyperlaneCustomError,
    {
        Self::ContractCall {
            function: function.into(),
            source: HyperlaneCustomErrorWrapper(Box::new(err)),
        }
    }

    /// Create a contract call error for `function` from a static string
    pub fn from_contract_error_str(function: impl Into<String>, err: &'static str) -> Self {
        Self::from_contract_error(function, StringError(err))
    }

    /// Whether the error was raised before reaching the contract
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the error was raised by the contract call itself
    pub fn is_contract_call(&self) -> bool {
        matches!(self, Self::ContractCall { .. })
    }
}

/// A chain reported an identifier which is not part of the network registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported network with chain id {chain_id}")]
pub struct UnsupportedNetworkError {
    /// The chain id reported by the RPC endpoint
    pub chain_id: u64,
}

/// Errors raised by inconsistent protocol constants.
#[derive(Debug, thiserror::Error)]
pub enum HyperlaneProtocolError {
    /// A registry entry holds an address that does not parse
    #[error("Invalid contract address `{address}` for network {network}: {reason}")]
    InvalidAddress {
        /// Network the address belongs to
        network: &'static str,
        /// The malformed address
        address: &'static str,
        /// Why parsing failed
        reason: String,
    },
}
