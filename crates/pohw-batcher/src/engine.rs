//! Batch draining (§4.8): snapshot pending work first, mutate only after
//! the snapshot is built.

use pohw_core::{Batch, ContentHash, PohwError, ProofRecord, Timestamp};
use pohw_merkle::MerkleTree;
use pohw_store::{BatchStore, ProofStore, RegistryStore};

/// Default drain threshold (§4.8, §6).
pub use pohw_core::constants::DEFAULT_BATCH_SIZE;

/// Derive a batch id deterministically from its root and creation time, so
/// retried drains after a partial failure (§4.8 "failure" clause) produce the
/// same id rather than minting a duplicate batch for the same snapshot.
fn derive_batch_id(root: &ContentHash, created_at: Timestamp) -> String {
    let mut buf = Vec::with_capacity(40);
    buf.extend_from_slice(root.as_bytes());
    buf.extend_from_slice(&created_at.to_be_bytes());
    let digest = pohw_core::hash(&buf);
    format!("0x{}", hex::encode(&digest.as_bytes()[..16]))
}

/// Snapshot every pending proof ordered by `submitted_at` (stable), build the
/// Merkle tree over their content hashes, persist the batch, and assign each
/// proof its index. Returns `None` when there is nothing pending.
///
/// Checks (in order):
/// 1. At least one pending proof exists.
pub fn drain_batch(store: &RegistryStore, now: Timestamp, max_size: usize) -> Result<Option<Batch>, PohwError> {
    let mut pending: Vec<ProofRecord> = store.list_pending_proofs(max_size)?;
    if pending.is_empty() {
        return Ok(None);
    }
    pending.sort_by_key(|p| p.submitted_at);

    let leaves: Vec<ContentHash> = pending.iter().map(|p| p.content_hash).collect();
    let tree = MerkleTree::build(&leaves)?;
    let root = tree.root();
    let batch_id = derive_batch_id(&root, now);

    // Idempotence (§4.8 "failure"): if a prior attempt already inserted this
    // exact batch, reuse it instead of erroring on the duplicate-id conflict.
    if let Some(existing) = store.get_batch(&batch_id)? {
        reassign_indices(store, &batch_id, &pending)?;
        return Ok(Some(existing));
    }

    let batch = Batch {
        batch_id: batch_id.clone(),
        root,
        size: pending.len() as u32,
        created_at: now,
        anchored_at: None,
        anchors: Vec::new(),
    };
    store.insert_batch(batch.clone(), leaves)?;
    reassign_indices(store, &batch_id, &pending)?;

    tracing::info!(batch_id = %batch_id, size = batch.size, root = %root, "batch drained");
    Ok(Some(batch))
}

/// `assignBatch` per proof, in snapshot order. The store is expected to make
/// this idempotent (§4.8), so re-running it after a partial failure is safe.
fn reassign_indices(store: &RegistryStore, batch_id: &str, pending: &[ProofRecord]) -> Result<(), PohwError> {
    for (index, proof) in pending.iter().enumerate() {
        store.assign_batch(&proof.content_hash, batch_id, index as u32)?;
    }
    Ok(())
}

/// Inclusion-proof retrieval by content hash (§4.8).
pub fn inclusion_proof_for(store: &RegistryStore, content_hash: &ContentHash) -> Result<Vec<ContentHash>, PohwError> {
    let proof = store
        .get_proof_by_content_hash(content_hash)?
        .ok_or_else(|| PohwError::ProofNotFound(content_hash.to_hex()))?;
    let batch_id = proof.batch_id.ok_or_else(|| PohwError::Validation("proof has not been batched yet".into()))?;
    let merkle_index = proof.merkle_index.ok_or_else(|| PohwError::StoreInconsistency("batched proof missing merkle index".into()))?;

    let leaves = store.batch_leaves(&batch_id)?;
    let tree = MerkleTree::build(&leaves)?;
    tree.inclusion_proof(merkle_index as usize)
}
