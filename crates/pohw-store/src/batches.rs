//! Batches (§4.3, §4.8). A batch is immutable once created except for its
//! `anchors` list, which only ever grows (§9: anchors are append-many).

use pohw_core::{Anchor, Batch, ContentHash, PohwError};

use crate::db::{de, ser, RegistryStore};
use crate::traits::BatchStore;

const LATEST_BATCH_KEY: &str = "latest_batch_id";

impl BatchStore for RegistryStore {
    fn insert_batch(&self, batch: Batch, leaves: Vec<ContentHash>) -> Result<(), PohwError> {
        let id = batch.batch_id.clone();
        if self.batches.contains_key(id.as_bytes()).map_err(|e| PohwError::Storage(e.to_string()))? {
            return Err(PohwError::Conflict {
                reason: "a batch already exists with this id".into(),
                existing_id: id,
            });
        }
        self.batch_leaves
            .insert(id.as_bytes(), ser(&leaves)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        self.batches
            .insert(id.as_bytes(), ser(&batch)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        self.put_meta(LATEST_BATCH_KEY, id.as_bytes())?;
        Ok(())
    }

    fn get_batch(&self, batch_id: &str) -> Result<Option<Batch>, PohwError> {
        match self.batches.get(batch_id.as_bytes()).map_err(|e| PohwError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_latest_batch(&self) -> Result<Option<Batch>, PohwError> {
        match self.get_meta(LATEST_BATCH_KEY)? {
            Some(id_bytes) => {
                let id = String::from_utf8(id_bytes).map_err(|e| PohwError::Serialization(e.to_string()))?;
                self.get_batch(&id)
            }
            None => Ok(None),
        }
    }

    fn list_batches(&self) -> Result<Vec<Batch>, PohwError> {
        let mut out = Vec::new();
        for item in self.batches.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            out.push(de(&bytes)?);
        }
        out.sort_by_key(|b: &Batch| b.created_at);
        Ok(out)
    }

    fn list_batch_proofs(&self, batch_id: &str) -> Result<Vec<pohw_core::ProofRecord>, PohwError> {
        let leaves = self.batch_leaves(batch_id)?;
        let mut out = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            match self.proofs.get(leaf.as_bytes()).map_err(|e| PohwError::Storage(e.to_string()))? {
                Some(bytes) => out.push(de(&bytes)?),
                None => {
                    return Err(PohwError::StoreInconsistency(format!(
                        "batch {batch_id} references missing proof {}",
                        leaf.to_hex()
                    )))
                }
            }
        }
        Ok(out)
    }

    fn batch_leaves(&self, batch_id: &str) -> Result<Vec<ContentHash>, PohwError> {
        match self
            .batch_leaves
            .get(batch_id.as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            Some(bytes) => de(&bytes),
            None => Err(PohwError::BatchNotFound(batch_id.to_string())),
        }
    }

    fn append_anchors(&self, batch_id: &str, anchors: Vec<Anchor>) -> Result<(), PohwError> {
        let mut batch = self
            .get_batch(batch_id)?
            .ok_or_else(|| PohwError::BatchNotFound(batch_id.to_string()))?;
        if batch.anchored_at.is_none() {
            if let Some(first) = anchors.first() {
                batch.anchored_at = Some(first.anchored_at);
            }
        }
        batch.anchors.extend(anchors);
        self.batches
            .insert(batch_id.as_bytes(), ser(&batch)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::temp_store;
    use crate::traits::ProofStore;
    use pohw_core::{ChainKind, Identifier, Signature, Tier};

    fn sample_proof(byte: u8) -> pohw_core::ProofRecord {
        pohw_core::ProofRecord {
            content_hash: ContentHash::from_bytes([byte; 32]),
            signature: Signature(vec![]),
            author_id: Identifier::parse("did:pohw:alice").unwrap(),
            author_timestamp: 1,
            submitted_at: 1,
            batch_id: None,
            merkle_index: None,
            process_digest: None,
            compound_hash: None,
            process_metrics: None,
            zk_proof_blob: None,
            tier: Tier::Grey,
            authored_on_device: None,
            environment_attestation: None,
            derived_from_refs: vec![],
            assistance_profile: None,
            claim_uri: None,
        }
    }

    #[test]
    fn insert_get_and_latest() {
        let store = temp_store("batches_basic");
        let leaf = ContentHash::from_bytes([0x01; 32]);
        store.insert_proof(sample_proof(0x01)).unwrap();
        let batch = Batch {
            batch_id: "batch-1".into(),
            root: leaf,
            size: 1,
            created_at: 100,
            anchored_at: None,
            anchors: vec![],
        };
        store.insert_batch(batch.clone(), vec![leaf]).unwrap();
        assert_eq!(store.get_batch("batch-1").unwrap().unwrap().batch_id, "batch-1");
        assert_eq!(store.get_latest_batch().unwrap().unwrap().batch_id, "batch-1");
        let proofs = store.list_batch_proofs("batch-1").unwrap();
        assert_eq!(proofs.len(), 1);
    }

    #[test]
    fn anchors_append_without_overwrite() {
        let store = temp_store("batches_anchors");
        let leaf = ContentHash::from_bytes([0x02; 32]);
        let batch = Batch {
            batch_id: "batch-2".into(),
            root: leaf,
            size: 1,
            created_at: 100,
            anchored_at: None,
            anchors: vec![],
        };
        store.insert_batch(batch, vec![leaf]).unwrap();
        store
            .append_anchors(
                "batch-2",
                vec![Anchor { chain: ChainKind::Bitcoin, tx_hash: "abc".into(), block_number: Some(1), anchored_at: 200 }],
            )
            .unwrap();
        store
            .append_anchors(
                "batch-2",
                vec![Anchor { chain: ChainKind::Ethereum, tx_hash: "def".into(), block_number: Some(2), anchored_at: 210 }],
            )
            .unwrap();
        let batch = store.get_batch("batch-2").unwrap().unwrap();
        assert_eq!(batch.anchors.len(), 2);
        assert_eq!(batch.anchored_at, Some(200));
    }

    #[test]
    fn duplicate_batch_id_conflicts() {
        let store = temp_store("batches_conflict");
        let leaf = ContentHash::from_bytes([0x03; 32]);
        let batch = Batch { batch_id: "batch-3".into(), root: leaf, size: 1, created_at: 1, anchored_at: None, anchors: vec![] };
        store.insert_batch(batch.clone(), vec![leaf]).unwrap();
        assert!(matches!(store.insert_batch(batch, vec![leaf]).unwrap_err(), PohwError::Conflict { .. }));
    }
}
