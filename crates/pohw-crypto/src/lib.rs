pub mod hash;
pub mod keypair;

pub use hash::{canonicalize, compound_hash, receipt_hash};
pub use keypair::{verify, KeyPair};
pub use pohw_core::hash as digest;
