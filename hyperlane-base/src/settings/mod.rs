pub use trace::*;

/// Tracing subscriber configuration
pub mod trace;
