//! This crate contains the shared runtime pieces of the Hyperlane network
//! exporter: the metrics registry, the HTTP server exposing it, and tracing
//! settings.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use metrics::*;
pub use server::*;

mod metrics;
mod server;

/// Settings shared by agent binaries
pub mod settings;
