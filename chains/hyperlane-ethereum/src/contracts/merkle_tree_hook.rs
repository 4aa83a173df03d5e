use ethers::abi::Abi;
use ethers::prelude::Lazy;

/// Name of the MerkleTreeHook view returning `(bytes32 root, uint32 index)`.
pub const LATEST_CHECKPOINT_FUNCTION: &str = "latestCheckpoint";

/// ABI of the read-only surface of the Hyperlane MerkleTreeHook contract.
pub static MERKLE_TREE_HOOK_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../abis/MerkleTreeHook.abi.json"))
        .expect("MerkleTreeHook ABI is valid JSON")
});
