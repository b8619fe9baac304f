//! Disputes and the append-only transparency log (§4.11).

use pohw_core::{Challenge, ContentHash, Identifier, PohwError, TransparencyLogEntry};

use crate::db::{de, ser, RegistryStore};
use crate::traits::DisputeStore;

impl DisputeStore for RegistryStore {
    fn insert_challenge(&self, challenge: Challenge) -> Result<(), PohwError> {
        if self
            .challenges
            .contains_key(challenge.id.as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            return Err(PohwError::Conflict {
                reason: "a challenge already exists with this id".into(),
                existing_id: challenge.id,
            });
        }
        self.challenges
            .insert(challenge.id.as_bytes(), ser(&challenge)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_challenge(&self, id: &str) -> Result<Option<Challenge>, PohwError> {
        match self.challenges.get(id.as_bytes()).map_err(|e| PohwError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_challenges_by_proof(&self, proof_hash: &ContentHash) -> Result<Vec<Challenge>, PohwError> {
        let mut out = Vec::new();
        for item in self.challenges.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            let challenge: Challenge = de(&bytes)?;
            if &challenge.proof_hash == proof_hash {
                out.push(challenge);
            }
        }
        Ok(out)
    }

    fn list_challenges_by_party(&self, identifier: &Identifier) -> Result<Vec<Challenge>, PohwError> {
        let mut out = Vec::new();
        for item in self.challenges.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            let challenge: Challenge = de(&bytes)?;
            if &challenge.challenger_id == identifier || &challenge.proof_author_id == identifier {
                out.push(challenge);
            }
        }
        Ok(out)
    }

    fn update_challenge(&self, challenge: Challenge) -> Result<(), PohwError> {
        if !self
            .challenges
            .contains_key(challenge.id.as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            return Err(PohwError::ChallengeNotFound(challenge.id));
        }
        self.challenges
            .insert(challenge.id.as_bytes(), ser(&challenge)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn append_transparency(&self, entry: TransparencyLogEntry) -> Result<(), PohwError> {
        let seq = self.next_seq("transparency")?;
        self.transparency
            .insert(seq.to_be_bytes(), ser(&entry)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn list_transparency(&self, limit: usize) -> Result<Vec<TransparencyLogEntry>, PohwError> {
        let mut out = Vec::new();
        for item in self.transparency.iter().rev() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            out.push(de(&bytes)?);
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::temp_store;
    use pohw_core::ChallengeStatus;

    fn sample_challenge(id: &str, proof: ContentHash) -> Challenge {
        Challenge {
            id: id.into(),
            proof_hash: proof,
            proof_author_id: Identifier::parse("did:pohw:alice").unwrap(),
            challenger_id: Identifier::parse("did:pohw:bob").unwrap(),
            reason: "duplicate".into(),
            description: "looks copied".into(),
            evidence: None,
            status: ChallengeStatus::Pending,
            resolution: None,
            created_at: 1,
            responded_at: None,
            resolved_at: None,
            author_response: None,
            resolver_id: None,
            resolution_notes: None,
        }
    }

    #[test]
    fn insert_get_and_update() {
        let store = temp_store("disputes_basic");
        let proof = ContentHash::from_bytes([0x01; 32]);
        store.insert_challenge(sample_challenge("ch-1", proof)).unwrap();
        let mut fetched = store.get_challenge("ch-1").unwrap().unwrap();
        fetched.status = ChallengeStatus::Responded;
        store.update_challenge(fetched).unwrap();
        assert_eq!(store.get_challenge("ch-1").unwrap().unwrap().status, ChallengeStatus::Responded);
    }

    #[test]
    fn lookup_by_proof_and_party() {
        let store = temp_store("disputes_lookup");
        let proof = ContentHash::from_bytes([0x02; 32]);
        store.insert_challenge(sample_challenge("ch-2", proof)).unwrap();
        assert_eq!(store.list_challenges_by_proof(&proof).unwrap().len(), 1);
        let bob = Identifier::parse("did:pohw:bob").unwrap();
        assert_eq!(store.list_challenges_by_party(&bob).unwrap().len(), 1);
    }

    #[test]
    fn update_missing_challenge_errors() {
        let store = temp_store("disputes_missing");
        let err = store.update_challenge(sample_challenge("ch-ghost", ContentHash::from_bytes([0x03; 32]))).unwrap_err();
        assert!(matches!(err, PohwError::ChallengeNotFound(_)));
    }

    #[test]
    fn transparency_log_returns_most_recent_first() {
        let store = temp_store("disputes_transparency");
        for i in 0..5 {
            store
                .append_transparency(TransparencyLogEntry {
                    entry_type: "challenge_created".into(),
                    challenge_id: format!("ch-{i}"),
                    proof_hash: ContentHash::from_bytes([i as u8; 32]),
                    actor_id: None,
                    resolution: None,
                    timestamp: i,
                    details: None,
                })
                .unwrap();
        }
        let latest = store.list_transparency(2).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].challenge_id, "ch-4");
        assert_eq!(latest[1].challenge_id, "ch-3");
    }
}
