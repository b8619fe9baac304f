//! Credential issuance, hashing, validity, and revocation (§4.5).

use pohw_core::{AssuranceLevel, AttestorStatus, AuditEntry, ContentHash, Credential, Identifier, PohwError, RevocationEntry, Signature, Timestamp};
use pohw_store::{AttestorStore, AuditStore, RegistryStore};

/// Deterministic SHA-256 over the credential's fields, excluding `proof`
/// (§4.5: the credential hash is the primary key and must be stable
/// regardless of the signature bytes layered on top).
pub fn credential_hash(credential: &Credential) -> ContentHash {
    let mut buf = Vec::new();
    for part in [credential.subject.as_str().as_bytes(), credential.attestor_id.as_str().as_bytes()] {
        buf.extend_from_slice(&(part.len() as u32).to_be_bytes());
        buf.extend_from_slice(part);
    }
    buf.push(credential.assurance_level as u8);
    buf.extend_from_slice(&credential.issued_at.to_be_bytes());
    buf.extend_from_slice(&credential.expires_at.unwrap_or(0).to_be_bytes());
    pohw_core::hash(&buf)
}

/// Issue a credential on behalf of `attestor_id`.
///
/// Checks (in order):
/// 1. The attestor exists and is `active` (§4.5: only active attestors may issue).
pub fn issue_credential(
    store: &RegistryStore,
    attestor_id: Identifier,
    subject: Identifier,
    assurance_level: AssuranceLevel,
    issued_at: Timestamp,
    expires_at: Option<Timestamp>,
    proof: Signature,
) -> Result<(ContentHash, Credential), PohwError> {
    let attestor = store
        .get_attestor(&attestor_id)?
        .ok_or_else(|| PohwError::AttestorNotFound(attestor_id.as_str().to_string()))?;
    if !attestor.status.can_issue() {
        return Err(PohwError::AttestorNotActive(attestor_id.as_str().to_string()));
    }

    let credential = Credential { subject: subject.clone(), attestor_id: attestor_id.clone(), assurance_level, issued_at, expires_at, proof };
    let hash = credential_hash(&credential);
    store.put_credential(hash, credential.clone())?;
    store.append_audit(AuditEntry {
        attestor_id,
        at: issued_at,
        kind: "credential_issued".into(),
        detail: format!("subject={} hash={}", subject.as_str(), hash.to_hex()),
    })?;
    Ok((hash, credential))
}

/// `exists(credential) ∧ ¬exists(revocation) ∧ (expiresAt == ⊥ ∨ expiresAt > now)` (§4.5).
pub fn is_valid(store: &RegistryStore, hash: &ContentHash, now: Timestamp) -> Result<bool, PohwError> {
    let credential = match store.get_credential(hash)? {
        Some(c) => c,
        None => return Ok(false),
    };
    if store.get_revocation(hash)?.is_some() {
        return Ok(false);
    }
    if let Some(expires_at) = credential.expires_at {
        if expires_at <= now {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Revoke a credential. Only the issuing attestor may revoke its own credential.
pub fn revoke_credential(
    store: &RegistryStore,
    credential_hash: ContentHash,
    attestor_id: Identifier,
    reason: String,
    attestor_signature: Signature,
    now: Timestamp,
) -> Result<(), PohwError> {
    let credential = store
        .get_credential(&credential_hash)?
        .ok_or_else(|| PohwError::CredentialNotFound(credential_hash.to_hex()))?;
    if credential.attestor_id != attestor_id {
        return Err(PohwError::Validation("only the issuing attestor may revoke this credential".into()));
    }
    store.put_revocation(RevocationEntry { credential_hash, revoked_at: now, reason, attestor_signature, attestor_id: attestor_id.clone() })?;
    store.append_audit(AuditEntry {
        attestor_id,
        at: now,
        kind: "credential_revoked".into(),
        detail: credential_hash.to_hex(),
    })?;
    Ok(())
}

pub fn attestor_can_issue(status: AttestorStatus) -> bool {
    status.can_issue()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{approve_attestor, register_attestor};
    use pohw_core::{AttestorType, KeyAlgorithm, PublicKey};
    use pohw_store::db::temp_store_for_tests as temp_store;

    fn active_attestor(store: &RegistryStore, id: &str) -> Identifier {
        let identifier = Identifier::parse(id).unwrap();
        register_attestor(
            store,
            pohw_core::AttestorRecord {
                identifier: identifier.clone(),
                name: "Example".into(),
                attestor_type: AttestorType::Academic,
                public_key: PublicKey { algorithm: KeyAlgorithm::Ed25519, bytes: vec![0; 32] },
                status: AttestorStatus::Active,
                registered_at: 0,
                last_audit: None,
                next_audit_due: None,
            },
            0,
        )
        .unwrap();
        approve_attestor(store, &identifier, 1).unwrap();
        identifier
    }

    #[test]
    fn inactive_attestor_cannot_issue() {
        let store = temp_store("credential_inactive");
        let identifier = Identifier::parse("attestor:pending").unwrap();
        register_attestor(
            &store,
            pohw_core::AttestorRecord {
                identifier: identifier.clone(),
                name: "X".into(),
                attestor_type: AttestorType::Academic,
                public_key: PublicKey { algorithm: KeyAlgorithm::Ed25519, bytes: vec![0; 32] },
                status: AttestorStatus::Active,
                registered_at: 0,
                last_audit: None,
                next_audit_due: None,
            },
            0,
        )
        .unwrap();
        let subject = Identifier::parse("did:pohw:alice").unwrap();
        let err = issue_credential(&store, identifier, subject, AssuranceLevel::Blue, 1, None, Signature(vec![])).unwrap_err();
        assert!(matches!(err, PohwError::AttestorNotActive(_)));
    }

    #[test]
    fn issued_credential_is_valid_until_expiry() {
        let store = temp_store("credential_validity");
        let attestor = active_attestor(&store, "attestor:uni");
        let subject = Identifier::parse("did:pohw:alice").unwrap();
        let (hash, _) = issue_credential(&store, attestor, subject, AssuranceLevel::Green, 10, Some(100), Signature(vec![])).unwrap();
        assert!(is_valid(&store, &hash, 50).unwrap());
        assert!(!is_valid(&store, &hash, 200).unwrap());
    }

    #[test]
    fn revocation_invalidates_credential() {
        let store = temp_store("credential_revocation");
        let attestor = active_attestor(&store, "attestor:uni");
        let subject = Identifier::parse("did:pohw:alice").unwrap();
        let (hash, _) = issue_credential(&store, attestor.clone(), subject, AssuranceLevel::Green, 10, None, Signature(vec![])).unwrap();
        assert!(is_valid(&store, &hash, 50).unwrap());
        revoke_credential(&store, hash, attestor, "compromised".into(), Signature(vec![]), 60).unwrap();
        assert!(!is_valid(&store, &hash, 70).unwrap());
    }
}
