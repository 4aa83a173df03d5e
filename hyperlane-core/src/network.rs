use std::str::FromStr;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::{HyperlaneProtocolError, UnsupportedNetworkError, H160};

/// Ethereum networks on which the Hyperlane MerkleTreeHook can be monitored.
///
/// The discriminant of each variant is the chain id reported by
/// `eth_chainId`. Supporting a new network means adding a variant here and
/// its contract address below.
#[derive(
    FromPrimitive,
    PartialEq,
    Eq,
    Debug,
    Clone,
    Copy,
    Hash,
    strum::Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum KnownNetwork {
    /// Ethereum mainnet
    Mainnet = 1,
    /// Holesky testnet
    Holesky = 17000,
}

impl KnownNetwork {
    /// The lowercase network name, used as the `network` metric label.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The chain id of this network.
    pub const fn chain_id(self) -> u64 {
        self as u64
    }

    /// Address of the Hyperlane MerkleTreeHook contract on this network.
    ///
    /// See https://docs.hyperlane.xyz/docs/reference/contract-addresses#merkle-tree-hook
    pub const fn merkle_tree_hook_address_str(self) -> &'static str {
        match self {
            KnownNetwork::Mainnet => "0x48e6c30B97748d1e2e03bf3e9FbE3890ca5f8CCA",
            KnownNetwork::Holesky => "0x98AAE089CaD930C64a76dD2247a2aC5773a4B8cE",
        }
    }

    /// Parsed address of the Hyperlane MerkleTreeHook contract on this
    /// network.
    pub fn merkle_tree_hook_address(self) -> Result<H160, HyperlaneProtocolError> {
        let address = self.merkle_tree_hook_address_str();
        H160::from_str(address).map_err(|err| HyperlaneProtocolError::InvalidAddress {
            network: self.as_str(),
            address,
            reason: err.to_string(),
        })
    }
}

impl TryFrom<u64> for KnownNetwork {
    type Error = UnsupportedNetworkError;

    fn try_from(chain_id: u64) -> Result<Self, Self::Error> {
        FromPrimitive::from_u64(chain_id).ok_or(UnsupportedNetworkError { chain_id })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use crate::{KnownNetwork, UnsupportedNetworkError};

    #[test]
    fn network_strings() {
        assert_eq!(
            KnownNetwork::from_str("mainnet").unwrap(),
            KnownNetwork::Mainnet,
        );
        assert_eq!(
            KnownNetwork::from_str("HoleSky").unwrap(),
            KnownNetwork::Holesky,
        );
        assert_eq!(KnownNetwork::Mainnet.to_string(), "mainnet");
        assert_eq!(KnownNetwork::Holesky.as_str(), "holesky");
        assert!("sepolia".parse::<KnownNetwork>().is_err());
    }

    #[test]
    fn chain_ids() {
        assert_eq!(KnownNetwork::try_from(1).unwrap(), KnownNetwork::Mainnet);
        assert_eq!(
            KnownNetwork::try_from(17000).unwrap(),
            KnownNetwork::Holesky
        );
        assert_eq!(KnownNetwork::Mainnet.chain_id(), 1);
        assert_eq!(KnownNetwork::Holesky.chain_id(), 17000);
    }

    #[test]
    fn every_network_round_trips_its_chain_id() {
        for network in KnownNetwork::iter() {
            assert_eq!(KnownNetwork::try_from(network.chain_id()), Ok(network));
        }
    }

    #[test]
    fn unsupported_chain_ids() {
        for chain_id in [0, 5, 56, 11155111, u64::MAX] {
            assert_eq!(
                KnownNetwork::try_from(chain_id),
                Err(UnsupportedNetworkError { chain_id })
            );
        }
    }

    #[test]
    fn merkle_tree_hook_addresses() {
        for network in KnownNetwork::iter() {
            let raw = network.merkle_tree_hook_address_str();
            assert!(!raw.is_empty());
            let address = network.merkle_tree_hook_address().unwrap();
            assert_eq!(format!("{:?}", address), raw.to_lowercase());
        }
    }
}
