pub mod client;
pub mod sync;
pub mod worker;

pub use client::{MerkleRootExchange, PeerClient};
pub use sync::{sync_once, PeerState, PeerStatus, SyncOutcome};
pub use worker::{PeerSyncHandle, PeerSyncWorker};
