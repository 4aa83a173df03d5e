//! The network exporter publishes the latest checkpoint acknowledged by the
//! Hyperlane MerkleTreeHook contract of an Ethereum network as a Prometheus
//! gauge.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod exporter;
pub mod settings;

#[cfg(test)]
mod test_utils;
