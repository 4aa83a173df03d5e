pub use chain_client::*;

mod chain_client;
