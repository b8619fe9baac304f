//! Wire DTOs for the JSON-RPC surface (§6). Every hash/signature crosses the
//! wire as `0x`-prefixed lowercase hex, never as a raw byte array, matching
//! §6's wire-format table rather than the store's internal `Serialize` impls.

use pohw_core::{
    Anchor, AssistanceProfile, Batch, Challenge, ChallengeResolution, ChallengeStatus, ContentHash, DerivedFromRef, Identifier, ProcessMetrics,
    ProofRecord, Signature, Tier, Timestamp,
};
use serde::{Deserialize, Serialize};

/// RFC 3339 UTC, per §6's Receipt wire format.
pub fn rfc3339(ts: Timestamp) -> String {
    chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.to_rfc3339()).unwrap_or_else(|| ts.to_string())
}

fn tier_str(tier: Tier) -> &'static str {
    match tier {
        Tier::Grey => "grey",
        Tier::Purple => "purple",
        Tier::Blue => "blue",
        Tier::Green => "green",
    }
}

fn assistance_profile_str(p: AssistanceProfile) -> &'static str {
    match p {
        AssistanceProfile::HumanOnly => "humanOnly",
        AssistanceProfile::AiAssisted => "aiAssisted",
        AssistanceProfile::AiGenerated => "aiGenerated",
    }
}

fn parse_assistance_profile(s: &str) -> Result<AssistanceProfile, String> {
    match s {
        "humanOnly" => Ok(AssistanceProfile::HumanOnly),
        "aiAssisted" => Ok(AssistanceProfile::AiAssisted),
        "aiGenerated" => Ok(AssistanceProfile::AiGenerated),
        other => Err(format!("unknown assistanceProfile '{other}'")),
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcProcessMetrics {
    #[serde(default)]
    pub entropy: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub input_events: Option<u64>,
    #[serde(default)]
    pub meets_thresholds: Option<bool>,
}

impl From<RpcProcessMetrics> for ProcessMetrics {
    fn from(m: RpcProcessMetrics) -> Self {
        ProcessMetrics { entropy: m.entropy, duration_ms: m.duration_ms, input_events: m.input_events, meets_thresholds: m.meets_thresholds }
    }
}

impl From<&ProcessMetrics> for RpcProcessMetrics {
    fn from(m: &ProcessMetrics) -> Self {
        RpcProcessMetrics { entropy: m.entropy, duration_ms: m.duration_ms, input_events: m.input_events, meets_thresholds: m.meets_thresholds }
    }
}

/// Tagged the same way ingress normalizes `derivedFrom` (§9): `{"kind":"contentHash","value":hex}` or `{"kind":"uri","value":..}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RpcDerivedFromRef {
    ContentHash { value: String },
    Uri { value: String },
}

impl TryFrom<RpcDerivedFromRef> for DerivedFromRef {
    type Error = String;
    fn try_from(r: RpcDerivedFromRef) -> Result<Self, String> {
        Ok(match r {
            RpcDerivedFromRef::ContentHash { value } => DerivedFromRef::ContentHash(ContentHash::from_hex(&value).map_err(|e| e.to_string())?),
            RpcDerivedFromRef::Uri { value } => DerivedFromRef::Uri(value),
        })
    }
}

impl From<&DerivedFromRef> for RpcDerivedFromRef {
    fn from(r: &DerivedFromRef) -> Self {
        match r {
            DerivedFromRef::ContentHash(h) => RpcDerivedFromRef::ContentHash { value: h.to_hex() },
            DerivedFromRef::Uri(u) => RpcDerivedFromRef::Uri { value: u.clone() },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcAnchor {
    pub chain: String,
    pub tx: String,
    #[serde(default)]
    pub block: Option<u64>,
    pub anchored_at: Timestamp,
}

impl From<&Anchor> for RpcAnchor {
    fn from(a: &Anchor) -> Self {
        RpcAnchor {
            chain: match a.chain {
                pohw_core::ChainKind::Bitcoin => "bitcoin".to_string(),
                pohw_core::ChainKind::Ethereum => "ethereum".to_string(),
            },
            tx: a.tx_hash.clone(),
            block: a.block_number,
            anchored_at: a.anchored_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcProofRecord {
    pub content_hash: String,
    pub signature: String,
    pub author_id: String,
    pub author_timestamp: Timestamp,
    pub submitted_at: Timestamp,
    pub batch_id: Option<String>,
    pub merkle_index: Option<u32>,
    pub process_digest: Option<String>,
    pub compound_hash: Option<String>,
    pub process_metrics: Option<RpcProcessMetrics>,
    pub tier: String,
    pub authored_on_device: Option<String>,
    pub environment_attestation: Option<String>,
    pub derived_from_refs: Vec<RpcDerivedFromRef>,
    pub assistance_profile: Option<String>,
    pub claim_uri: Option<String>,
}

impl From<&ProofRecord> for RpcProofRecord {
    fn from(p: &ProofRecord) -> Self {
        RpcProofRecord {
            content_hash: p.content_hash.to_hex(),
            signature: hex::encode(&p.signature.0),
            author_id: p.author_id.as_str().to_string(),
            author_timestamp: p.author_timestamp,
            submitted_at: p.submitted_at,
            batch_id: p.batch_id.clone(),
            merkle_index: p.merkle_index,
            process_digest: p.process_digest.map(|h| h.to_hex()),
            compound_hash: p.compound_hash.map(|h| h.to_hex()),
            process_metrics: p.process_metrics.as_ref().map(RpcProcessMetrics::from),
            tier: tier_str(p.tier).to_string(),
            authored_on_device: p.authored_on_device.clone(),
            environment_attestation: p.environment_attestation.clone(),
            derived_from_refs: p.derived_from_refs.iter().map(RpcDerivedFromRef::from).collect(),
            assistance_profile: p.assistance_profile.map(assistance_profile_str).map(str::to_string),
            claim_uri: p.claim_uri.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBatch {
    pub batch_id: String,
    pub root: String,
    pub size: u32,
    pub created_at: Timestamp,
    pub anchored_at: Option<Timestamp>,
    pub anchors: Vec<RpcAnchor>,
}

impl From<&Batch> for RpcBatch {
    fn from(b: &Batch) -> Self {
        RpcBatch {
            batch_id: b.batch_id.clone(),
            root: b.root.to_hex(),
            size: b.size,
            created_at: b.created_at,
            anchored_at: b.anchored_at,
            anchors: b.anchors.iter().map(RpcAnchor::from).collect(),
        }
    }
}

/// `{ proof: [hex...], root: hex, anchors: [{chain, tx, block?}] }` (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcInclusionProof {
    pub proof: Vec<String>,
    pub root: String,
    pub anchors: Vec<RpcAnchor>,
}

fn challenge_status_str(s: ChallengeStatus) -> &'static str {
    match s {
        ChallengeStatus::Pending => "pending",
        ChallengeStatus::Responded => "responded",
        ChallengeStatus::Resolved => "resolved",
        ChallengeStatus::Dismissed => "dismissed",
    }
}

fn challenge_resolution_str(r: ChallengeResolution) -> &'static str {
    match r {
        ChallengeResolution::Exonerated => "exonerated",
        ChallengeResolution::Confirmed => "confirmed",
        ChallengeResolution::Dismissed => "dismissed",
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcChallenge {
    pub id: String,
    pub proof_hash: String,
    pub proof_author_id: String,
    pub challenger_id: String,
    pub reason: String,
    pub description: String,
    pub evidence: Option<String>,
    pub status: String,
    pub resolution: Option<String>,
    pub created_at: Timestamp,
    pub responded_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub author_response: Option<String>,
    pub resolver_id: Option<String>,
    pub resolution_notes: Option<String>,
}

impl From<&Challenge> for RpcChallenge {
    fn from(c: &Challenge) -> Self {
        RpcChallenge {
            id: c.id.clone(),
            proof_hash: c.proof_hash.to_hex(),
            proof_author_id: c.proof_author_id.as_str().to_string(),
            challenger_id: c.challenger_id.as_str().to_string(),
            reason: c.reason.clone(),
            description: c.description.clone(),
            evidence: c.evidence.clone(),
            status: challenge_status_str(c.status).to_string(),
            resolution: c.resolution.map(challenge_resolution_str).map(str::to_string),
            created_at: c.created_at,
            responded_at: c.responded_at,
            resolved_at: c.resolved_at,
            author_response: c.author_response.clone(),
            resolver_id: c.resolver_id.as_ref().map(|i| i.as_str().to_string()),
            resolution_notes: c.resolution_notes.clone(),
        }
    }
}

/// Raw, not-yet-validated submission over the wire (§4.7, §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSubmitRequest {
    pub content_hash: String,
    pub signature: String,
    pub author_id: String,
    pub author_timestamp: Timestamp,
    #[serde(default)]
    pub process_metrics: Option<RpcProcessMetrics>,
    #[serde(default)]
    pub zk_proof_blob: Option<String>,
    #[serde(default)]
    pub authored_on_device: Option<String>,
    #[serde(default)]
    pub environment_attestation: Option<String>,
    #[serde(default)]
    pub derived_from_refs: Vec<RpcDerivedFromRef>,
    #[serde(default)]
    pub assistance_profile: Option<String>,
    #[serde(default)]
    pub claim_uri: Option<String>,
}

impl RpcSubmitRequest {
    pub fn try_into_domain(self) -> Result<pohw_intake::SubmitRequest, String> {
        let content_hash = ContentHash::from_hex(&self.content_hash).map_err(|e| format!("invalid contentHash: {e}"))?;
        let signature = Signature(hex::decode(&self.signature).map_err(|e| format!("invalid signature hex: {e}"))?);
        let author_id = Identifier::parse(self.author_id).map_err(|e| e.to_string())?;
        let zk_proof_blob = self.zk_proof_blob.map(|s| hex::decode(&s).map_err(|e| e.to_string())).transpose()?;
        let assistance_profile = self.assistance_profile.as_deref().map(parse_assistance_profile).transpose()?;
        let derived_from_refs = self.derived_from_refs.into_iter().map(DerivedFromRef::try_from).collect::<Result<Vec<_>, _>>()?;

        Ok(pohw_intake::SubmitRequest {
            content_hash,
            signature,
            author_id,
            author_timestamp: self.author_timestamp,
            process_metrics: self.process_metrics.map(ProcessMetrics::from),
            zk_proof_blob,
            authored_on_device: self.authored_on_device,
            environment_attestation: self.environment_attestation,
            derived_from_refs,
            assistance_profile,
            claim_uri: self.claim_uri,
        })
    }
}

/// `{ receiptHash, timestamp (RFC 3339 UTC), registry }` (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub receipt_hash: String,
    pub timestamp: String,
    pub registry: String,
}

impl From<&pohw_intake::Receipt> for RpcReceipt {
    fn from(r: &pohw_intake::Receipt) -> Self {
        RpcReceipt { receipt_hash: r.receipt_hash.to_hex(), timestamp: rfc3339(r.timestamp), registry: r.registry_id.clone() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSubmitOutcome {
    pub accepted: bool,
    pub receipt: RpcReceipt,
}

/// Result of one chain's anchor attempt (§4.9), for the operator-facing
/// `requestAnchor` admin method.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcAnchorOutcome {
    pub chain: String,
    pub ok: bool,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

impl From<&pohw_anchor::AnchorOutcome> for RpcAnchorOutcome {
    fn from(o: &pohw_anchor::AnchorOutcome) -> Self {
        RpcAnchorOutcome {
            chain: match o.chain {
                pohw_core::ChainKind::Bitcoin => "bitcoin".to_string(),
                pohw_core::ChainKind::Ethereum => "ethereum".to_string(),
            },
            ok: o.ok,
            tx_hash: o.tx_hash.clone(),
            error: o.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_from_ref_tags_content_hash_variant_on_the_wire() {
        let rpc = RpcDerivedFromRef::ContentHash { value: ContentHash::from_bytes([0x07; 32]).to_hex() };
        let json = serde_json::to_value(&rpc).unwrap();
        assert_eq!(json["kind"], "contentHash");
        let domain: DerivedFromRef = rpc.try_into().unwrap();
        assert!(matches!(domain, DerivedFromRef::ContentHash(_)));
    }

    #[test]
    fn derived_from_ref_rejects_malformed_hex() {
        let rpc = RpcDerivedFromRef::ContentHash { value: "not-hex".to_string() };
        assert!(DerivedFromRef::try_from(rpc).is_err());
    }

    #[test]
    fn try_into_domain_rejects_unknown_assistance_profile() {
        let request = RpcSubmitRequest {
            content_hash: ContentHash::from_bytes([0x08; 32]).to_hex(),
            signature: hex::encode([1, 2, 3]),
            author_id: "did:pohw:alice".to_string(),
            author_timestamp: 100,
            process_metrics: None,
            zk_proof_blob: None,
            authored_on_device: None,
            environment_attestation: None,
            derived_from_refs: vec![],
            assistance_profile: Some("bogus".to_string()),
            claim_uri: None,
        };
        assert!(request.try_into_domain().is_err());
    }

    #[test]
    fn try_into_domain_accepts_a_well_formed_request() {
        let request = RpcSubmitRequest {
            content_hash: ContentHash::from_bytes([0x09; 32]).to_hex(),
            signature: hex::encode([1, 2, 3]),
            author_id: "did:pohw:alice".to_string(),
            author_timestamp: 100,
            process_metrics: None,
            zk_proof_blob: None,
            authored_on_device: None,
            environment_attestation: None,
            derived_from_refs: vec![],
            assistance_profile: Some("aiAssisted".to_string()),
            claim_uri: None,
        };
        let domain = request.try_into_domain().unwrap();
        assert_eq!(domain.assistance_profile, Some(AssistanceProfile::AiAssisted));
    }

    #[test]
    fn receipt_timestamp_renders_as_rfc3339() {
        assert_eq!(rfc3339(0), "1970-01-01T00:00:00+00:00");
    }
}
