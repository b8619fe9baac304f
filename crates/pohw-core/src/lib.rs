pub mod constants;
pub mod error;
pub mod model;
pub mod types;

pub use error::PohwError;
pub use model::*;
pub use types::{ContentHash, Identifier, KeyAlgorithm, PublicKey, Signature, Timestamp};

/// SHA-256, the registry's canonical digest function (§4.1).
pub fn hash(bytes: &[u8]) -> ContentHash {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    ContentHash(out)
}
