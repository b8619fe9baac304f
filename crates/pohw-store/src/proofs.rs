//! Proof records (§4.3). Keyed by content hash; unique-by-contentHash is
//! enforced at `insert_proof`, so `list_proofs_by_content_hash` only ever
//! returns zero or one entries — kept as a list for interface symmetry with
//! the rest of the store (§9 open-question decision).

use pohw_core::{ContentHash, PohwError, ProofRecord};

use crate::db::{de, ser, RegistryStore};
use crate::traits::ProofStore;

impl ProofStore for RegistryStore {
    fn insert_proof(&self, proof: ProofRecord) -> Result<(), PohwError> {
        let key = proof.content_hash.as_bytes().to_vec();
        if self.proofs.contains_key(&key).map_err(|e| PohwError::Storage(e.to_string()))? {
            return Err(PohwError::Conflict {
                reason: "a proof already exists for this content hash".into(),
                existing_id: proof.content_hash.to_hex(),
            });
        }
        if let Some(compound) = proof.compound_hash {
            self.proofs_by_compound
                .insert(compound.as_bytes(), key.as_slice())
                .map_err(|e| PohwError::Storage(e.to_string()))?;
        }
        self.proofs.insert(key, ser(&proof)?).map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_proof_by_content_hash(&self, hash: &ContentHash) -> Result<Option<ProofRecord>, PohwError> {
        match self.proofs.get(hash.as_bytes()).map_err(|e| PohwError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_proof_by_compound_hash(&self, hash: &ContentHash) -> Result<Option<ProofRecord>, PohwError> {
        let content_hash_bytes = match self
            .proofs_by_compound
            .get(hash.as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        match self
            .proofs
            .get(content_hash_bytes.as_ref())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_proofs_by_content_hash(&self, hash: &ContentHash) -> Result<Vec<ProofRecord>, PohwError> {
        Ok(self.get_proof_by_content_hash(hash)?.into_iter().collect())
    }

    fn list_pending_proofs(&self, limit: usize) -> Result<Vec<ProofRecord>, PohwError> {
        let mut pending = Vec::new();
        for item in self.proofs.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            let proof: ProofRecord = de(&bytes)?;
            if proof.is_pending() {
                pending.push(proof);
            }
        }
        pending.sort_by_key(|p| p.submitted_at);
        pending.truncate(limit);
        Ok(pending)
    }

    fn count_pending_proofs(&self) -> Result<u64, PohwError> {
        let mut count = 0u64;
        for item in self.proofs.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            let proof: ProofRecord = de(&bytes)?;
            if proof.is_pending() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn count_total_proofs(&self) -> Result<u64, PohwError> {
        Ok(self.proofs.len() as u64)
    }

    fn list_proofs_since(&self, since: u64) -> Result<Vec<ProofRecord>, PohwError> {
        let mut all = Vec::new();
        for item in self.proofs.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            all.push(de::<ProofRecord>(&bytes)?);
        }
        all.sort_by_key(|p| p.submitted_at);
        Ok(all.into_iter().skip(since as usize).collect())
    }

    fn assign_batch(&self, hash: &ContentHash, batch_id: &str, merkle_index: u32) -> Result<(), PohwError> {
        let key = hash.as_bytes().to_vec();
        let bytes = self
            .proofs
            .get(&key)
            .map_err(|e| PohwError::Storage(e.to_string()))?
            .ok_or_else(|| PohwError::ProofNotFound(hash.to_hex()))?;
        let mut proof: ProofRecord = de(&bytes)?;
        proof.batch_id = Some(batch_id.to_string());
        proof.merkle_index = Some(merkle_index);
        self.proofs.insert(key, ser(&proof)?).map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::temp_store;
    use pohw_core::{Identifier, Signature, Tier};

    fn sample_proof(byte: u8) -> ProofRecord {
        ProofRecord {
            content_hash: ContentHash::from_bytes([byte; 32]),
            signature: Signature(vec![1, 2, 3]),
            author_id: Identifier::parse("did:pohw:alice").unwrap(),
            author_timestamp: 1_000,
            submitted_at: 1_000,
            batch_id: None,
            merkle_index: None,
            process_digest: None,
            compound_hash: Some(ContentHash::from_bytes([byte.wrapping_add(1); 32])),
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
    fn insert_and_fetch_round_trip() {
        let store = temp_store("proofs_roundtrip");
        let proof = sample_proof(0x01);
        store.insert_proof(proof.clone()).unwrap();
        let fetched = store.get_proof_by_content_hash(&proof.content_hash).unwrap().unwrap();
        assert_eq!(fetched.content_hash, proof.content_hash);
        let by_compound = store
            .get_proof_by_compound_hash(&proof.compound_hash.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(by_compound.content_hash, proof.content_hash);
    }

    #[test]
    fn duplicate_content_hash_conflicts() {
        let store = temp_store("proofs_conflict");
        let proof = sample_proof(0x02);
        store.insert_proof(proof.clone()).unwrap();
        let err = store.insert_proof(proof).unwrap_err();
        assert!(matches!(err, PohwError::Conflict { .. }));
    }

    #[test]
    fn pending_count_excludes_batched() {
        let store = temp_store("proofs_pending");
        let a = sample_proof(0x03);
        let b = sample_proof(0x04);
        store.insert_proof(a.clone()).unwrap();
        store.insert_proof(b).unwrap();
        assert_eq!(store.count_pending_proofs().unwrap(), 2);
        store.assign_batch(&a.content_hash, "batch-1", 0).unwrap();
        assert_eq!(store.count_pending_proofs().unwrap(), 1);
        assert_eq!(store.count_total_proofs().unwrap(), 2);
    }

    #[test]
    fn assign_batch_missing_proof_errors() {
        let store = temp_store("proofs_missing");
        let err = store.assign_batch(&ContentHash::from_bytes([0xFF; 32]), "batch-1", 0).unwrap_err();
        assert!(matches!(err, PohwError::ProofNotFound(_)));
    }

    #[test]
    fn list_proofs_since_skips_the_cursor() {
        let store = temp_store("proofs_since");
        let mut a = sample_proof(0x05);
        a.submitted_at = 100;
        let mut b = sample_proof(0x06);
        b.submitted_at = 200;
        store.insert_proof(a.clone()).unwrap();
        store.insert_proof(b.clone()).unwrap();
        let since_zero = store.list_proofs_since(0).unwrap();
        assert_eq!(since_zero.len(), 2);
        let since_one = store.list_proofs_since(1).unwrap();
        assert_eq!(since_one.len(), 1);
        assert_eq!(since_one[0].content_hash, b.content_hash);
    }
}
