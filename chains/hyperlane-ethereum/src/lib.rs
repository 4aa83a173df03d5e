//! Interfaces to the ethereum contracts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use self::{contracts::*, rpc_clients::*};

mod contracts;

/// Ethers JSONRPC Client implementations
mod rpc_clients;
