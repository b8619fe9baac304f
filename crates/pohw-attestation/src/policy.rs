//! Multi-attestor policy evaluation and tier derivation (§4.5).

use std::collections::HashSet;

use pohw_core::{AssistanceProfile, AssuranceLevel, AttestorType, Identifier, PohwError, Tier};
use pohw_store::{AttestorStore, RegistryStore};

use crate::credential::is_valid;

/// A named policy: `minAttestations`, an optional required-type set, and an
/// assurance floor (§4.5).
pub struct Policy {
    pub min_attestations: u32,
    pub required_types: Option<Vec<AttestorType>>,
    pub min_assurance_level: AssuranceLevel,
}

/// Evaluate `policy` against `subject`'s currently-valid credentials.
///
/// Checks (a)-(e) from §4.5: each credential valid, issued by an active
/// attestor, total count at or above threshold, each at or above the
/// assurance floor, and (if required types are set) at least one attestor
/// of a required type present.
pub fn evaluate_policy(store: &RegistryStore, subject: &Identifier, policy: &Policy, now: i64) -> Result<bool, PohwError> {
    let credentials = store.list_credentials_for_subject(subject)?;
    let mut qualifying = 0u32;
    let mut types_seen = HashSet::new();

    for credential in &credentials {
        let hash = crate::credential::credential_hash(credential);
        if !is_valid(store, &hash, now)? {
            continue;
        }
        if credential.assurance_level < policy.min_assurance_level {
            continue;
        }
        let attestor = match store.get_attestor(&credential.attestor_id)? {
            Some(a) if a.status.can_issue() => a,
            _ => continue,
        };
        qualifying += 1;
        types_seen.insert(attestor.attestor_type);
    }

    if qualifying < policy.min_attestations {
        return Ok(false);
    }
    if let Some(required) = &policy.required_types {
        if !required.iter().any(|t| types_seen.contains(t)) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Pure tier-derivation function on `(subjectId, assistanceProfile)` (§4.5).
/// AI involvement always caps the tier at `purple`; otherwise the subject's
/// valid credentials are checked against the `green` then `blue` policy.
pub fn derive_tier(store: &RegistryStore, subject: &Identifier, assistance_profile: AssistanceProfile, now: i64) -> Result<Tier, PohwError> {
    if matches!(assistance_profile, AssistanceProfile::AiAssisted | AssistanceProfile::AiGenerated) {
        return Ok(Tier::Purple);
    }

    let green_policy = Policy { min_attestations: 2, required_types: None, min_assurance_level: AssuranceLevel::Green };
    if evaluate_policy(store, subject, &green_policy, now)? && distinct_attestor_types(store, subject, now)? >= 2 {
        return Ok(Tier::Green);
    }

    let blue_policy = Policy { min_attestations: 1, required_types: None, min_assurance_level: AssuranceLevel::Blue };
    if evaluate_policy(store, subject, &blue_policy, now)? {
        return Ok(Tier::Blue);
    }

    Ok(Tier::Grey)
}

fn distinct_attestor_types(store: &RegistryStore, subject: &Identifier, now: i64) -> Result<usize, PohwError> {
    let credentials = store.list_credentials_for_subject(subject)?;
    let mut types = HashSet::new();
    for credential in &credentials {
        let hash = crate::credential::credential_hash(credential);
        if !is_valid(store, &hash, now)? || credential.assurance_level < AssuranceLevel::Green {
            continue;
        }
        if let Some(attestor) = store.get_attestor(&credential.attestor_id)? {
            if attestor.status.can_issue() {
                types.insert(attestor.attestor_type);
            }
        }
    }
    Ok(types.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::issue_credential;
    use crate::lifecycle::{approve_attestor, register_attestor};
    use pohw_core::{AttestorRecord, AttestorStatus, KeyAlgorithm, PublicKey, Signature};
    use pohw_store::db::temp_store_for_tests as temp_store;

    fn active_attestor(store: &RegistryStore, id: &str, attestor_type: AttestorType) -> Identifier {
        let identifier = Identifier::parse(id).unwrap();
        register_attestor(
            store,
            AttestorRecord {
                identifier: identifier.clone(),
                name: id.into(),
                attestor_type,
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
    fn ai_assistance_caps_at_purple() {
        let store = temp_store("policy_ai_cap");
        let subject = Identifier::parse("did:pohw:alice").unwrap();
        let tier = derive_tier(&store, &subject, AssistanceProfile::AiGenerated, 100).unwrap();
        assert_eq!(tier, Tier::Purple);
    }

    #[test]
    fn no_credentials_yields_grey() {
        let store = temp_store("policy_no_credentials");
        let subject = Identifier::parse("did:pohw:alice").unwrap();
        let tier = derive_tier(&store, &subject, AssistanceProfile::HumanOnly, 100).unwrap();
        assert_eq!(tier, Tier::Grey);
    }

    #[test]
    fn single_blue_credential_yields_blue() {
        let store = temp_store("policy_single_blue");
        let attestor = active_attestor(&store, "attestor:uni", AttestorType::Academic);
        let subject = Identifier::parse("did:pohw:alice").unwrap();
        issue_credential(&store, attestor, subject.clone(), AssuranceLevel::Blue, 1, None, Signature(vec![])).unwrap();
        let tier = derive_tier(&store, &subject, AssistanceProfile::HumanOnly, 100).unwrap();
        assert_eq!(tier, Tier::Blue);
    }

    #[test]
    fn two_distinct_green_credentials_yield_green() {
        let store = temp_store("policy_two_green");
        let uni = active_attestor(&store, "attestor:uni", AttestorType::Academic);
        let employer = active_attestor(&store, "attestor:employer", AttestorType::Professional);
        let subject = Identifier::parse("did:pohw:alice").unwrap();
        issue_credential(&store, uni, subject.clone(), AssuranceLevel::Green, 1, None, Signature(vec![])).unwrap();
        issue_credential(&store, employer, subject.clone(), AssuranceLevel::Green, 1, None, Signature(vec![])).unwrap();
        let tier = derive_tier(&store, &subject, AssistanceProfile::HumanOnly, 100).unwrap();
        assert_eq!(tier, Tier::Green);
    }
}
