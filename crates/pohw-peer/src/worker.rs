//! Background peer-sync worker: a cheap handle the rest of the node holds,
//! and a worker that owns all mutable state and runs in its own task.

use std::sync::Arc;
use std::time::Duration;

use pohw_core::constants::DEFAULT_SYNC_INTERVAL_MS;
use pohw_store::RegistryStore;
use tokio::sync::mpsc;

use crate::client::PeerClient;
use crate::sync::{sync_once, PeerState};

/// Handle held by the rest of the node. `trigger_sync` requests an immediate,
/// out-of-cycle sync (§4.10 "on demand").
pub struct PeerSyncHandle {
    trigger_tx: mpsc::Sender<()>,
}

impl PeerSyncHandle {
    pub async fn trigger_sync(&self) {
        let _ = self.trigger_tx.send(()).await;
    }
}

/// Owns every configured peer's state. Peers are synced serially (no two
/// concurrent syncs against the same peer); across peers, concurrently
/// (§5 "Peer sync is serialized per peer ... across peers it is parallel").
pub struct PeerSyncWorker {
    store: Arc<RegistryStore>,
    peers: Vec<(PeerClient, PeerState)>,
    interval_ms: u64,
    trigger_rx: mpsc::Receiver<()>,
}

impl PeerSyncWorker {
    pub fn new(store: Arc<RegistryStore>, endpoints: Vec<String>) -> (Self, PeerSyncHandle) {
        let peers = endpoints.into_iter().map(|endpoint| (PeerClient::new(endpoint.clone()), PeerState::new(endpoint))).collect();
        let (trigger_tx, trigger_rx) = mpsc::channel(8);
        (Self { store, peers, interval_ms: DEFAULT_SYNC_INTERVAL_MS, trigger_rx }, PeerSyncHandle { trigger_tx })
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Drive the sync loop. Run in a dedicated tokio task.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.interval_ms));
        loop {
            tokio::select! {
                _ = interval.tick() => self.sync_all().await,
                Some(()) = self.trigger_rx.recv() => self.sync_all().await,
            }
        }
    }

    async fn sync_all(&mut self) {
        let now = chrono::Utc::now().timestamp();
        let store = Arc::clone(&self.store);
        let futures = self.peers.iter_mut().map(move |(client, state)| {
            let store = Arc::clone(&store);
            async move {
                let outcome = sync_once(&store, client, state, now).await;
                tracing::info!(
                    endpoint = %state.endpoint,
                    status = ?state.status,
                    proofs_imported = outcome.proofs_imported,
                    batches_imported = outcome.batches_imported,
                    "peer sync cycle complete"
                );
            }
        });
        futures::future::join_all(futures).await;
    }
}
