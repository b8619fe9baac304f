pub mod tree;

pub use tree::{verify_proof, MerkleTree};
