//! Identifier registration and key rotation (§4.4). Each rejection is
//! checked in sequence before any write happens, and the whole operation
//! either persists in full or not at all.

use pohw_core::{
    ContinuityNode, ContinuityStatus, Identifier, IdentityDocument, PohwError, PublicKey, Signature,
    Timestamp, VerificationMethod,
};
use pohw_store::{IdentityStore, RegistryStore};

/// The message a continuity claim is signed over: `oldId || newId || newKey`,
/// length-prefixed the same way `pohw_crypto::hash::canonicalize` is — stable
/// across languages, not bincode's internal representation.
pub fn rotation_message(old_id: &Identifier, new_id: &Identifier, new_key: &PublicKey) -> Vec<u8> {
    let mut buf = Vec::new();
    for part in [old_id.as_str().as_bytes(), new_id.as_str().as_bytes()] {
        buf.extend_from_slice(&(part.len() as u32).to_be_bytes());
        buf.extend_from_slice(part);
    }
    buf.push(match new_key.algorithm {
        pohw_core::KeyAlgorithm::Ed25519 => 0u8,
    });
    buf.extend_from_slice(&(new_key.bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(&new_key.bytes);
    buf
}

/// Register a fresh identifier with its initial document and continuity node.
///
/// Checks (in order):
/// 1. At least one verification method.
/// 2. The identifier isn't already registered.
pub fn register_identifier(
    store: &RegistryStore,
    identifier: Identifier,
    verification_methods: Vec<VerificationMethod>,
    now: Timestamp,
) -> Result<IdentityDocument, PohwError> {
    if verification_methods.is_empty() {
        return Err(PohwError::Validation(
            "identity document requires at least one verification method".into(),
        ));
    }
    if store.get_document(&identifier)?.is_some() {
        return Err(PohwError::Conflict {
            reason: "identifier is already registered".into(),
            existing_id: identifier.as_str().to_string(),
        });
    }

    let key_fingerprint = pohw_core::hash(&verification_methods[0].key.bytes);
    let document = IdentityDocument {
        identifier: identifier.clone(),
        verification_methods,
        created_at: now,
        previous_identifier: None,
        continuity_claim: None,
    };
    let node = ContinuityNode {
        identifier,
        key_fingerprint,
        previous_identifier: None,
        continuity_claim: None,
        created_at: now,
        status: ContinuityStatus::Active,
    };

    store.put_document(document.clone())?;
    store.put_continuity_node(node)?;
    Ok(document)
}

/// Rotate `old_id` to `new_identifier`, carrying a continuity claim signed
/// by one of the old identifier's verification methods (§4.4).
///
/// Checks (in order):
/// 1. Old identifier is registered and its continuity node is `active`.
/// 2. `new_identifier` isn't already registered.
/// 3. `claim_signature` verifies under at least one of the old document's keys.
/// 4. Rotating to `new_identifier` would not introduce a cycle.
pub fn rotate_identifier(
    store: &RegistryStore,
    old_id: &Identifier,
    new_identifier: Identifier,
    new_public_key: PublicKey,
    claim_signature: Signature,
    now: Timestamp,
) -> Result<IdentityDocument, PohwError> {
    let old_document = store
        .get_document(old_id)?
        .ok_or_else(|| PohwError::IdentifierNotFound(old_id.as_str().to_string()))?;
    let old_node = store
        .get_continuity_node(old_id)?
        .ok_or_else(|| PohwError::IdentifierNotFound(old_id.as_str().to_string()))?;
    if old_node.status != ContinuityStatus::Active {
        return Err(PohwError::Conflict {
            reason: "identifier has already been rotated or revoked".into(),
            existing_id: old_id.as_str().to_string(),
        });
    }

    if store.get_document(&new_identifier)?.is_some() {
        return Err(PohwError::Conflict {
            reason: "new identifier is already registered".into(),
            existing_id: new_identifier.as_str().to_string(),
        });
    }

    let message = rotation_message(old_id, &new_identifier, &new_public_key);
    let verifies = old_document
        .verification_methods
        .iter()
        .any(|vm| pohw_crypto::verify(&vm.key, &message, &claim_signature).is_ok());
    if !verifies {
        return Err(PohwError::WrongRotationKey(old_id.as_str().to_string()));
    }

    let ancestors = store.walk_continuity_chain(old_id)?;
    if ancestors.iter().any(|node| node.identifier == new_identifier) {
        return Err(PohwError::ContinuityCycle(new_identifier.as_str().to_string()));
    }

    let key_fingerprint = pohw_core::hash(&new_public_key.bytes);
    let new_document = IdentityDocument {
        identifier: new_identifier.clone(),
        verification_methods: vec![VerificationMethod { key: new_public_key, created_at: now }],
        created_at: now,
        previous_identifier: Some(old_id.clone()),
        continuity_claim: Some(claim_signature.clone()),
    };
    let new_node = ContinuityNode {
        identifier: new_identifier,
        key_fingerprint,
        previous_identifier: Some(old_id.clone()),
        continuity_claim: Some(claim_signature),
        created_at: now,
        status: ContinuityStatus::Active,
    };
    let mut rotated_old_node = old_node;
    rotated_old_node.status = ContinuityStatus::Rotated;

    store.put_document(new_document.clone())?;
    store.put_continuity_node(new_node)?;
    store.put_continuity_node(rotated_old_node)?;
    Ok(new_document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pohw_core::KeyAlgorithm;
    use pohw_crypto::KeyPair;
    use pohw_store::db::temp_store_for_tests as temp_store;

    fn vm_for(kp: &KeyPair, now: Timestamp) -> VerificationMethod {
        VerificationMethod { key: kp.public_key.clone(), created_at: now }
    }

    #[test]
    fn register_requires_at_least_one_method() {
        let store = temp_store("identity_register_empty");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        let err = register_identifier(&store, id, vec![], 0).unwrap_err();
        assert!(matches!(err, PohwError::Validation(_)));
    }

    #[test]
    fn register_then_duplicate_conflicts() {
        let store = temp_store("identity_register_dup");
        let kp = KeyPair::generate();
        let id = Identifier::parse("did:pohw:alice").unwrap();
        register_identifier(&store, id.clone(), vec![vm_for(&kp, 0)], 0).unwrap();
        let err = register_identifier(&store, id, vec![vm_for(&kp, 0)], 0).unwrap_err();
        assert!(matches!(err, PohwError::Conflict { .. }));
    }

    #[test]
    fn rotation_with_valid_claim_succeeds() {
        let store = temp_store("identity_rotate_ok");
        let old_kp = KeyPair::generate();
        let new_kp = KeyPair::generate();
        let old_id = Identifier::parse("did:pohw:alice-v1").unwrap();
        let new_id = Identifier::parse("did:pohw:alice-v2").unwrap();
        register_identifier(&store, old_id.clone(), vec![vm_for(&old_kp, 0)], 0).unwrap();

        let message = rotation_message(&old_id, &new_id, &new_kp.public_key);
        let claim = old_kp.sign(&message);

        let doc = rotate_identifier(&store, &old_id, new_id.clone(), new_kp.public_key.clone(), claim, 10).unwrap();
        assert_eq!(doc.identifier, new_id);
        assert_eq!(doc.previous_identifier, Some(old_id.clone()));

        let old_node = store.get_continuity_node(&old_id).unwrap().unwrap();
        assert_eq!(old_node.status, ContinuityStatus::Rotated);

        let chain = store.walk_continuity_chain(&new_id).unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn rotation_with_wrong_key_rejected() {
        let store = temp_store("identity_rotate_wrong_key");
        let old_kp = KeyPair::generate();
        let attacker_kp = KeyPair::generate();
        let new_kp = KeyPair::generate();
        let old_id = Identifier::parse("did:pohw:bob-v1").unwrap();
        let new_id = Identifier::parse("did:pohw:bob-v2").unwrap();
        register_identifier(&store, old_id.clone(), vec![vm_for(&old_kp, 0)], 0).unwrap();

        let message = rotation_message(&old_id, &new_id, &new_kp.public_key);
        let forged_claim = attacker_kp.sign(&message);

        let err = rotate_identifier(&store, &old_id, new_id, new_kp.public_key, forged_claim, 10).unwrap_err();
        assert!(matches!(err, PohwError::WrongRotationKey(_)));
    }

    #[test]
    fn rotation_of_unknown_identifier_fails() {
        let store = temp_store("identity_rotate_unknown");
        let new_kp = KeyPair::generate();
        let old_id = Identifier::parse("did:pohw:ghost").unwrap();
        let new_id = Identifier::parse("did:pohw:ghost-v2").unwrap();
        let claim = Signature(vec![0; 64]);
        let err = rotate_identifier(&store, &old_id, new_id, new_kp.public_key, claim, 10).unwrap_err();
        assert!(matches!(err, PohwError::IdentifierNotFound(_)));
        let _ = KeyAlgorithm::Ed25519;
    }
}
