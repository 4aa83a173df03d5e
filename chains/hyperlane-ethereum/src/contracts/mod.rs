pub use merkle_tree_hook::*;

mod merkle_tree_hook;
