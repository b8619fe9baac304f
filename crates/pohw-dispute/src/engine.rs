//! Dispute lifecycle (§4.11). Terminal states refuse further transitions;
//! every transition appends an audit/transparency entry.

use pohw_core::{Challenge, ChallengeResolution, ChallengeStatus, ContentHash, Identifier, PohwError, Timestamp, TransparencyLogEntry};
use pohw_store::{DisputeStore, ProofStore, RegistryStore};

/// `H(proofHash || challengerId || createdAt)[:16]`, `0x`-prefixed (§4.11).
fn derive_challenge_id(proof_hash: &ContentHash, challenger_id: &Identifier, created_at: Timestamp) -> String {
    let mut buf = Vec::new();
    buf.extend_from_slice(proof_hash.as_bytes());
    buf.extend_from_slice(challenger_id.as_str().as_bytes());
    buf.extend_from_slice(&created_at.to_be_bytes());
    let digest = pohw_core::hash(&buf);
    format!("0x{}", hex::encode(&digest.as_bytes()[..16]))
}

fn log(store: &RegistryStore, entry_type: &str, challenge: &Challenge, at: Timestamp, actor: Option<Identifier>, details: Option<String>) -> Result<(), PohwError> {
    store.append_transparency(TransparencyLogEntry {
        entry_type: entry_type.to_string(),
        challenge_id: challenge.id.clone(),
        proof_hash: challenge.proof_hash,
        actor_id: actor,
        resolution: challenge.resolution,
        timestamp: at,
        details,
    })
}

/// Checks (in order):
/// 1. The challenged proof exists.
/// 2. The challenger is not the proof's author.
/// 3. The derived challenge id is not already in use.
pub fn submit_challenge(
    store: &RegistryStore,
    proof_hash: ContentHash,
    challenger_id: Identifier,
    reason: String,
    description: String,
    evidence: Option<String>,
    now: Timestamp,
) -> Result<Challenge, PohwError> {
    let proof = store.get_proof_by_content_hash(&proof_hash)?.ok_or_else(|| PohwError::ProofNotFound(proof_hash.to_hex()))?;
    if challenger_id == proof.author_id {
        return Err(PohwError::Validation("a proof's author cannot challenge their own proof".into()));
    }

    let id = derive_challenge_id(&proof_hash, &challenger_id, now);
    if store.get_challenge(&id)?.is_some() {
        return Err(PohwError::Conflict { reason: "challenge already exists for this proof/challenger/timestamp".into(), existing_id: id });
    }

    let challenge = Challenge {
        id,
        proof_hash,
        proof_author_id: proof.author_id,
        challenger_id: challenger_id.clone(),
        reason,
        description,
        evidence,
        status: ChallengeStatus::Pending,
        resolution: None,
        created_at: now,
        responded_at: None,
        resolved_at: None,
        author_response: None,
        resolver_id: None,
        resolution_notes: None,
    };
    store.insert_challenge(challenge.clone())?;
    log(store, "submitted", &challenge, now, Some(challenger_id), None)?;
    Ok(challenge)
}

/// Checks (in order):
/// 1. The challenge exists and is not terminal.
/// 2. `responder_id` matches the proof's author.
pub fn respond_to_challenge(store: &RegistryStore, challenge_id: &str, responder_id: &Identifier, response: String, now: Timestamp) -> Result<Challenge, PohwError> {
    let mut challenge = store.get_challenge(challenge_id)?.ok_or_else(|| PohwError::ChallengeNotFound(challenge_id.to_string()))?;
    if challenge.status.is_terminal() {
        return Err(PohwError::Conflict { reason: format!("challenge is already terminal ({:?})", challenge.status), existing_id: challenge_id.to_string() });
    }
    if responder_id != &challenge.proof_author_id {
        return Err(PohwError::Validation("only the proof's author may respond to a challenge".into()));
    }

    challenge.status = ChallengeStatus::Responded;
    challenge.responded_at = Some(now);
    challenge.author_response = Some(response.clone());
    store.update_challenge(challenge.clone())?;
    log(store, "responded", &challenge, now, Some(responder_id.clone()), Some(response))?;
    Ok(challenge)
}

/// Resolving `confirmed` decrements the proof author's reputation;
/// `exonerated` makes no automatic change; `dismissed` is terminal with no
/// reputation effect (§4.11).
///
/// Checks (in order):
/// 1. The challenge exists and is not already terminal.
pub fn resolve_challenge(
    store: &RegistryStore,
    challenge_id: &str,
    resolver_id: Identifier,
    resolution: ChallengeResolution,
    notes: Option<String>,
    now: Timestamp,
) -> Result<Challenge, PohwError> {
    let mut challenge = store.get_challenge(challenge_id)?.ok_or_else(|| PohwError::ChallengeNotFound(challenge_id.to_string()))?;
    if challenge.status.is_terminal() {
        return Err(PohwError::Conflict { reason: format!("challenge is already terminal ({:?})", challenge.status), existing_id: challenge_id.to_string() });
    }

    challenge.status = if matches!(resolution, ChallengeResolution::Dismissed) { ChallengeStatus::Dismissed } else { ChallengeStatus::Resolved };
    challenge.resolution = Some(resolution);
    challenge.resolved_at = Some(now);
    challenge.resolver_id = Some(resolver_id.clone());
    challenge.resolution_notes = notes.clone();
    store.update_challenge(challenge.clone())?;
    log(store, "resolved", &challenge, now, Some(resolver_id), notes)?;

    if matches!(resolution, ChallengeResolution::Confirmed) {
        pohw_fraud::record_confirmed_fraud(store, &challenge.proof_author_id, now)?;
    }

    Ok(challenge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pohw_core::{AssistanceProfile, ProofRecord, Reputation, Signature, Tier};
    use pohw_store::db::temp_store_for_tests as temp_store;

    fn seed_proof(store: &RegistryStore, author: &Identifier) -> ContentHash {
        let hash = ContentHash::from_bytes([0x09; 32]);
        store
            .insert_proof(ProofRecord {
                content_hash: hash,
                signature: Signature(vec![0u8; 64]),
                author_id: author.clone(),
                author_timestamp: 0,
                submitted_at: 0,
                batch_id: None,
                merkle_index: None,
                process_digest: None,
                compound_hash: None,
                process_metrics: None,
                zk_proof_blob: None,
                tier: Tier::Blue,
                authored_on_device: None,
                environment_attestation: None,
                derived_from_refs: vec![],
                assistance_profile: Some(AssistanceProfile::HumanOnly),
                claim_uri: None,
            })
            .unwrap();
        hash
    }

    #[test]
    fn author_cannot_challenge_own_proof() {
        let store = temp_store("dispute_self_challenge");
        let author = Identifier::parse("did:pohw:alice").unwrap();
        let hash = seed_proof(&store, &author);
        let err = submit_challenge(&store, hash, author, "reason".into(), "desc".into(), None, 100).unwrap_err();
        assert!(matches!(err, PohwError::Validation(_)));
    }

    #[test]
    fn full_lifecycle_to_confirmed_decrements_reputation() {
        let store = temp_store("dispute_full_lifecycle");
        let author = Identifier::parse("did:pohw:alice").unwrap();
        let challenger = Identifier::parse("did:pohw:bob").unwrap();
        store.put_reputation(Reputation::new(author.clone(), 0)).unwrap();
        let hash = seed_proof(&store, &author);

        let challenge = submit_challenge(&store, hash, challenger.clone(), "plagiarism".into(), "details".into(), None, 100).unwrap();
        assert_eq!(challenge.status, ChallengeStatus::Pending);

        let responded = respond_to_challenge(&store, &challenge.id, &author, "it's mine".into(), 200).unwrap();
        assert_eq!(responded.status, ChallengeStatus::Responded);

        let before = store.get_reputation(&author).unwrap().unwrap().score;
        let resolved = resolve_challenge(&store, &challenge.id, Identifier::parse("did:pohw:arbitrator").unwrap(), ChallengeResolution::Confirmed, None, 300).unwrap();
        assert_eq!(resolved.status, ChallengeStatus::Resolved);
        let after = store.get_reputation(&author).unwrap().unwrap().score;
        assert!(after < before);
    }

    #[test]
    fn terminal_challenge_rejects_further_transitions() {
        let store = temp_store("dispute_terminal");
        let author = Identifier::parse("did:pohw:alice").unwrap();
        let challenger = Identifier::parse("did:pohw:bob").unwrap();
        let hash = seed_proof(&store, &author);
        let challenge = submit_challenge(&store, hash, challenger, "reason".into(), "desc".into(), None, 100).unwrap();
        resolve_challenge(&store, &challenge.id, Identifier::parse("did:pohw:arbitrator").unwrap(), ChallengeResolution::Dismissed, None, 200).unwrap();

        let err = respond_to_challenge(&store, &challenge.id, &author, "too late".into(), 300).unwrap_err();
        assert!(matches!(err, PohwError::Conflict { .. }));
    }

    #[test]
    fn duplicate_challenge_id_is_rejected() {
        let store = temp_store("dispute_duplicate");
        let author = Identifier::parse("did:pohw:alice").unwrap();
        let challenger = Identifier::parse("did:pohw:bob").unwrap();
        let hash = seed_proof(&store, &author);
        submit_challenge(&store, hash, challenger.clone(), "reason".into(), "desc".into(), None, 100).unwrap();
        let err = submit_challenge(&store, hash, challenger, "reason".into(), "desc".into(), None, 100).unwrap_err();
        assert!(matches!(err, PohwError::Conflict { .. }));
    }
}
