//! This crate contains the core primitives, traits, and types shared by the
//! Hyperlane network exporter crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use ethers_core::abi::Abi;
pub use ethers_core::types::{H160, U256};

pub use error::*;
pub use network::*;
pub use traits::*;

mod error;
mod network;

/// Traits for interacting with a chain
pub mod traits;
