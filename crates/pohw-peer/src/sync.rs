//! Gap-fill sync against a single peer (§4.10).

use pohw_core::{ContentHash, PohwError, Timestamp};
use pohw_store::{BatchStore, ProofStore, RegistryStore};

use crate::client::PeerClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerStatus {
    Active,
    Inactive,
    Error,
}

#[derive(Clone, Debug)]
pub struct PeerState {
    pub endpoint: String,
    pub status: PeerStatus,
    pub last_sync: Option<Timestamp>,
}

impl PeerState {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), status: PeerStatus::Inactive, last_sync: None }
    }
}

/// Outcome of one sync attempt against a peer (§4.10 step 1-4).
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub proofs_imported: usize,
    pub batches_imported: usize,
    pub already_current: bool,
}

/// Run one sync cycle against `peer`. Mutates `state`'s status/last_sync in
/// place regardless of outcome (§4.10 step 4: "flip to error without
/// removing; resume on next cycle").
pub async fn sync_once(store: &RegistryStore, peer: &PeerClient, state: &mut PeerState, now: Timestamp) -> SyncOutcome {
    match try_sync(store, peer).await {
        Ok(outcome) => {
            state.status = PeerStatus::Active;
            state.last_sync = Some(now);
            outcome
        }
        Err(err) => {
            tracing::warn!(endpoint = %state.endpoint, error = %err, "peer sync failed");
            state.status = PeerStatus::Error;
            state.last_sync = Some(now);
            SyncOutcome::default()
        }
    }
}

async fn try_sync(store: &RegistryStore, peer: &PeerClient) -> Result<SyncOutcome, PohwError> {
    use std::collections::HashMap;

    let exchange = peer.root_exchange().await?;

    let local_latest_root = store.get_latest_batch()?.map(|b| b.root);
    if local_latest_root == Some(exchange.merkle_root) {
        return Ok(SyncOutcome { already_current: true, ..Default::default() });
    }

    // Leaves for a batch never synced before are reassembled from the
    // ordered (merkleIndex, contentHash) pairs carried on its own proofs —
    // those fields are not "transient" and travel with the proof (§4.10
    // step 3), so no separate leaf-list fetch is needed.
    let mut leaves_by_batch: HashMap<String, Vec<(u32, ContentHash)>> = HashMap::new();

    let local_total_proofs = store.count_total_proofs()?;
    let mut proofs_imported = 0;
    for proof in peer.proofs_since(local_total_proofs).await? {
        if store.get_proof_by_content_hash(&proof.content_hash)?.is_none() {
            if let (Some(batch_id), Some(index)) = (&proof.batch_id, proof.merkle_index) {
                leaves_by_batch.entry(batch_id.clone()).or_default().push((index, proof.content_hash));
            }
            store.insert_proof(proof)?;
            proofs_imported += 1;
        }
    }

    let mut batches_imported = 0;
    for batch in peer.batches().await? {
        if store.get_batch(&batch.batch_id)?.is_none() {
            let mut ordered = leaves_by_batch.remove(&batch.batch_id).unwrap_or_default();
            ordered.sort_by_key(|(index, _)| *index);
            let leaves = ordered.into_iter().map(|(_, hash)| hash).collect();
            store.insert_batch(batch, leaves)?;
            batches_imported += 1;
        }
    }

    Ok(SyncOutcome { proofs_imported, batches_imported, already_current: false })
}
