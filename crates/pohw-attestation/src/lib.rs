pub mod credential;
pub mod lifecycle;
pub mod policy;

pub use credential::{credential_hash, is_valid, issue_credential, revoke_credential};
pub use lifecycle::{approve_attestor, register_attestor, revoke_attestor, suspend_attestor};
pub use policy::{derive_tier, evaluate_policy, Policy};
