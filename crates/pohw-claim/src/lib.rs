pub mod builder;

pub use builder::{build_claim, validate_claim, Claim, ClaimInputs, RevocationState};
