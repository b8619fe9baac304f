//! Claim assembly (§4.12): a pure transform from a `ProofRecord` plus its
//! Merkle proof, anchors and dispute history into the canonical signed claim
//! object. No I/O — callers gather every input from the store first.

use pohw_core::{
    Anchor, AssistanceProfile, Challenge, ChallengeResolution, ChallengeStatus, ContentHash, Identifier, ProcessMetrics, ProofRecord, Signature, Tier,
    Timestamp,
};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationState {
    /// No challenge has ever been raised, or all raised challenges were
    /// exonerated/dismissed.
    Clear,
    /// A challenge is open (pending or responded, not yet resolved).
    Disputed,
    /// A challenge against this proof resolved `confirmed`.
    Revoked,
}

fn revocation_state(challenges: &[Challenge]) -> RevocationState {
    if challenges.iter().any(|c| c.status == ChallengeStatus::Resolved && c.resolution == Some(ChallengeResolution::Confirmed)) {
        return RevocationState::Revoked;
    }
    if challenges.iter().any(|c| !c.status.is_terminal()) {
        return RevocationState::Disputed;
    }
    RevocationState::Clear
}

/// Everything the builder needs, gathered by the caller (§4.12 "no I/O").
pub struct ClaimInputs {
    pub proof: ProofRecord,
    pub inclusion_proof: Vec<ContentHash>,
    pub anchors: Vec<Anchor>,
    pub challenges: Vec<Challenge>,
    pub registry_id: String,
    pub registry_base_url: String,
}

/// The canonical signed claim object (§4.12).
#[derive(Clone, Debug, Serialize)]
pub struct Claim {
    pub content_hash: ContentHash,
    pub author_id: Identifier,
    pub timestamp: Timestamp,
    pub signature: Signature,
    pub registry_id: String,
    pub tier: Tier,
    pub assistance_profile: Option<AssistanceProfile>,
    pub process_digest: Option<ContentHash>,
    pub compound_hash: Option<ContentHash>,
    /// Opaque summary strings, e.g. `entropy>0.742`, never raw process
    /// telemetry (§4.12: "rendered as opaque strings").
    pub entropy_summary: Option<String>,
    pub coherence_summary: Option<String>,
    pub derived_from_refs: Vec<pohw_core::DerivedFromRef>,
    pub environment_attestation: Option<String>,
    pub inclusion_proof: Vec<ContentHash>,
    pub anchors: Vec<Anchor>,
    pub revocation_state: RevocationState,
    pub claim_url: String,
}

fn entropy_summary(metrics: &Option<ProcessMetrics>) -> Option<String> {
    metrics.as_ref().and_then(|m| m.entropy).map(|e| format!("entropy>{e:.3}"))
}

/// Temporal coherence has no dedicated metric field in `ProcessMetrics`;
/// approximate it from input-event density over duration, the same way
/// `meets_thresholds` is derived in intake when not supplied explicitly.
fn coherence_summary(metrics: &Option<ProcessMetrics>) -> Option<String> {
    let metrics = metrics.as_ref()?;
    let events = metrics.input_events? as f64;
    let duration_s = (metrics.duration_ms? as f64) / 1000.0;
    if duration_s <= 0.0 {
        return None;
    }
    Some(format!("coherence>{:.3}", events / duration_s))
}

pub fn build_claim(inputs: ClaimInputs) -> Claim {
    let ClaimInputs { proof, inclusion_proof, anchors, challenges, registry_id, registry_base_url } = inputs;

    Claim {
        content_hash: proof.content_hash,
        author_id: proof.author_id,
        timestamp: proof.author_timestamp,
        signature: proof.signature,
        registry_id: registry_id.clone(),
        tier: proof.tier,
        assistance_profile: proof.assistance_profile,
        process_digest: proof.process_digest,
        compound_hash: proof.compound_hash,
        entropy_summary: entropy_summary(&proof.process_metrics),
        coherence_summary: coherence_summary(&proof.process_metrics),
        derived_from_refs: proof.derived_from_refs,
        environment_attestation: proof.environment_attestation,
        inclusion_proof,
        anchors,
        revocation_state: revocation_state(&challenges),
        claim_url: format!("{registry_base_url}/v1/claims/{}", proof.content_hash.to_hex()),
    }
}

/// Dual of `build_claim`: re-checks shape and required-field presence
/// without trusting that `claim` came from this registry's own builder
/// (§4.12 "a validator peer exists as a dual").
pub fn validate_claim(claim: &Claim) -> Result<(), String> {
    if claim.registry_id.is_empty() {
        return Err("claim is missing a registry id".into());
    }
    if claim.signature.0.is_empty() {
        return Err("claim is missing a signature".into());
    }
    if claim.claim_url.is_empty() {
        return Err("claim is missing its self-referential URL".into());
    }
    if claim.compound_hash.is_some() && claim.process_digest.is_none() {
        return Err("claim carries a compound hash with no process digest to back it".into());
    }
    Ok(())
}
