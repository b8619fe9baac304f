pub mod bitcoin;
pub mod coordinator;
pub mod ethereum;
pub mod payload;
pub mod retry;
pub mod rpc;

pub use coordinator::{AnchorCoordinator, AnchorOutcome};
pub use payload::{AnchorPayload, AnchorResult};
