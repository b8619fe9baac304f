//! The entity data model (§3).

use serde::{Deserialize, Serialize};

use crate::types::{ContentHash, Identifier, PublicKey, Signature, Timestamp};

/// Quality band assigned to a proof record (GLOSSARY).
/// Ordered `grey < purple < blue < green` (§4.5, §4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Grey,
    Purple,
    Blue,
    Green,
}

/// Assurance level of a human-verification credential. Same ordering as `Tier` (GLOSSARY).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssuranceLevel {
    Grey,
    Purple,
    Blue,
    Green,
}

/// How a submission was produced, as resolved by intake (§4.7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssistanceProfile {
    HumanOnly,
    AiAssisted,
    AiGenerated,
}

/// Per-submission process metrics (§3, §4.7). A typed replacement for the
/// original's `any`-typed metrics bag (§9 re-architecture guidance).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProcessMetrics {
    #[serde(default)]
    pub entropy: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub input_events: Option<u64>,
    #[serde(default)]
    pub meets_thresholds: Option<bool>,
}

/// A reference to a source a submission was derived from. Replaces the
/// original's `string | string[] | object[]` shape with a single tagged sum
/// normalized at ingress (§9).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DerivedFromRef {
    ContentHash(ContentHash),
    Uri(String),
}

/// The central record (§3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofRecord {
    pub content_hash: ContentHash,
    pub signature: Signature,
    pub author_id: Identifier,
    pub author_timestamp: Timestamp,
    pub submitted_at: Timestamp,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub merkle_index: Option<u32>,
    #[serde(default)]
    pub process_digest: Option<ContentHash>,
    #[serde(default)]
    pub compound_hash: Option<ContentHash>,
    #[serde(default)]
    pub process_metrics: Option<ProcessMetrics>,
    /// Opaque, unverified commitment blob. Not a true ZK proof (§9 open question).
    #[serde(default)]
    pub zk_proof_blob: Option<Vec<u8>>,
    pub tier: Tier,
    #[serde(default)]
    pub authored_on_device: Option<String>,
    #[serde(default)]
    pub environment_attestation: Option<String>,
    #[serde(default)]
    pub derived_from_refs: Vec<DerivedFromRef>,
    #[serde(default)]
    pub assistance_profile: Option<AssistanceProfile>,
    #[serde(default)]
    pub claim_uri: Option<String>,
}

impl ProofRecord {
    pub fn is_pending(&self) -> bool {
        self.batch_id.is_none()
    }
}

/// A blockchain anchor appended to a batch (§3). Anchors are append-only;
/// storage is append-many per the §9 open-question decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Anchor {
    pub chain: ChainKind,
    pub tx_hash: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    pub anchored_at: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainKind {
    Bitcoin,
    Ethereum,
}

/// A Merkle-committed group of proofs (§3). Immutable once created save for
/// `anchors`, which only ever grows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub root: ContentHash,
    pub size: u32,
    pub created_at: Timestamp,
    #[serde(default)]
    pub anchored_at: Option<Timestamp>,
    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

/// A verification method bound to an identity document (§4.4).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub key: PublicKey,
    pub created_at: Timestamp,
}

/// Document for an identifier (§3, §4.4).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityDocument {
    pub identifier: Identifier,
    pub verification_methods: Vec<VerificationMethod>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub previous_identifier: Option<Identifier>,
    #[serde(default)]
    pub continuity_claim: Option<Signature>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContinuityStatus {
    Active,
    Rotated,
    Revoked,
}

/// One node in the identifier rotation graph (§3, §4.4).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContinuityNode {
    pub identifier: Identifier,
    pub key_fingerprint: ContentHash,
    #[serde(default)]
    pub previous_identifier: Option<Identifier>,
    #[serde(default)]
    pub continuity_claim: Option<Signature>,
    pub created_at: Timestamp,
    pub status: ContinuityStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttestorType {
    Academic,
    Professional,
    Media,
    Civic,
    Commercial,
    Community,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttestorStatus {
    Pending,
    Active,
    Suspended,
    Revoked,
}

impl AttestorStatus {
    /// Only `active` attestors may issue credentials (§4.5).
    pub fn can_issue(&self) -> bool {
        matches!(self, AttestorStatus::Active)
    }
}

/// An accredited issuer of human-verification credentials (§3, §4.5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttestorRecord {
    pub identifier: Identifier,
    pub name: String,
    pub attestor_type: AttestorType,
    pub public_key: PublicKey,
    pub status: AttestorStatus,
    pub registered_at: Timestamp,
    #[serde(default)]
    pub last_audit: Option<Timestamp>,
    #[serde(default)]
    pub next_audit_due: Option<Timestamp>,
}

/// A verifiable claim issued by an active attestor (§3, §4.5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credential {
    pub subject: Identifier,
    pub attestor_id: Identifier,
    pub assurance_level: AssuranceLevel,
    pub issued_at: Timestamp,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    /// The signed proof over the credential body; excluded from the credential hash (§4.5).
    pub proof: Signature,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevocationEntry {
    pub credential_hash: ContentHash,
    pub revoked_at: Timestamp,
    pub reason: String,
    pub attestor_signature: Signature,
    pub attestor_id: Identifier,
}

/// Per-identifier reputation record (§3, §4.6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reputation {
    pub identifier: Identifier,
    pub score: u8,
    pub tier: Tier,
    pub successful_proofs: u64,
    pub anomalies: u64,
    pub last_updated: Timestamp,
}

impl Reputation {
    pub fn new(identifier: Identifier, now: Timestamp) -> Self {
        Self {
            identifier,
            score: 100,
            tier: Tier::Blue,
            successful_proofs: 0,
            anomalies: 0,
            last_updated: now,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    Pending,
    Responded,
    Resolved,
    Dismissed,
}

impl ChallengeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengeStatus::Resolved | ChallengeStatus::Dismissed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeResolution {
    Exonerated,
    Confirmed,
    Dismissed,
}

/// A dispute over a proof record (§3, §4.11).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub proof_hash: ContentHash,
    pub proof_author_id: Identifier,
    pub challenger_id: Identifier,
    pub reason: String,
    pub description: String,
    #[serde(default)]
    pub evidence: Option<String>,
    pub status: ChallengeStatus,
    #[serde(default)]
    pub resolution: Option<ChallengeResolution>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub responded_at: Option<Timestamp>,
    #[serde(default)]
    pub resolved_at: Option<Timestamp>,
    #[serde(default)]
    pub author_response: Option<String>,
    #[serde(default)]
    pub resolver_id: Option<Identifier>,
    #[serde(default)]
    pub resolution_notes: Option<String>,
}

/// Append-only dispute-lifecycle event (§3, §4.11).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransparencyLogEntry {
    pub entry_type: String,
    pub challenge_id: String,
    pub proof_hash: ContentHash,
    #[serde(default)]
    pub actor_id: Option<Identifier>,
    #[serde(default)]
    pub resolution: Option<ChallengeResolution>,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub details: Option<String>,
}

/// A submission event recorded for fraud-mitigation history (§4.6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub identifier: Identifier,
    pub at: Timestamp,
    #[serde(default)]
    pub entropy: Option<f64>,
}

/// A flagged fraud-mitigation anomaly (§4.6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub identifier: Identifier,
    pub at: Timestamp,
    pub kind: String,
    pub detail: String,
}

/// An immutable attestor-audit-log entry (§4.5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub attestor_id: Identifier,
    pub at: Timestamp,
    pub kind: String,
    pub detail: String,
}
