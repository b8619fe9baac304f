//! One capability interface per subdomain (§4.3, §9: "a narrow capability
//! interface consumed by every other component; a concrete implementation
//! may multiplex them over a single backend"). Every other crate depends on
//! these traits, never on `RegistryStore` directly.

use pohw_core::{
    Anchor, AttestorRecord, AuditEntry, AnomalyRecord, Batch, Challenge, ContentHash, Credential,
    Identifier, IdentityDocument, ContinuityNode, PohwError, ProofRecord, Reputation,
    RevocationEntry, SubmissionRecord, Timestamp, TransparencyLogEntry,
};

pub trait ProofStore {
    fn insert_proof(&self, proof: ProofRecord) -> Result<(), PohwError>;
    fn get_proof_by_content_hash(&self, hash: &ContentHash) -> Result<Option<ProofRecord>, PohwError>;
    fn get_proof_by_compound_hash(&self, hash: &ContentHash) -> Result<Option<ProofRecord>, PohwError>;
    fn list_proofs_by_content_hash(&self, hash: &ContentHash) -> Result<Vec<ProofRecord>, PohwError>;
    fn list_pending_proofs(&self, limit: usize) -> Result<Vec<ProofRecord>, PohwError>;
    fn count_pending_proofs(&self) -> Result<u64, PohwError>;
    fn count_total_proofs(&self) -> Result<u64, PohwError>;
    /// All proofs ordered by `submittedAt`, skipping the first `since` of
    /// them — the peer-sync gap-fill cursor (§4.10: "fetch peer's proofs
    /// since local total_proofs").
    fn list_proofs_since(&self, since: u64) -> Result<Vec<ProofRecord>, PohwError>;
    fn assign_batch(&self, hash: &ContentHash, batch_id: &str, merkle_index: u32) -> Result<(), PohwError>;
}

pub trait BatchStore {
    fn insert_batch(&self, batch: Batch, leaves: Vec<ContentHash>) -> Result<(), PohwError>;
    fn get_batch(&self, batch_id: &str) -> Result<Option<Batch>, PohwError>;
    fn get_latest_batch(&self) -> Result<Option<Batch>, PohwError>;
    fn list_batches(&self) -> Result<Vec<Batch>, PohwError>;
    fn list_batch_proofs(&self, batch_id: &str) -> Result<Vec<ProofRecord>, PohwError>;
    fn batch_leaves(&self, batch_id: &str) -> Result<Vec<ContentHash>, PohwError>;
    fn append_anchors(&self, batch_id: &str, anchors: Vec<Anchor>) -> Result<(), PohwError>;
}

pub trait IdentityStore {
    fn put_document(&self, doc: IdentityDocument) -> Result<(), PohwError>;
    fn get_document(&self, identifier: &Identifier) -> Result<Option<IdentityDocument>, PohwError>;
    fn list_documents(&self) -> Result<Vec<IdentityDocument>, PohwError>;
    fn put_continuity_node(&self, node: ContinuityNode) -> Result<(), PohwError>;
    fn get_continuity_node(&self, identifier: &Identifier) -> Result<Option<ContinuityNode>, PohwError>;
    fn walk_continuity_chain(&self, identifier: &Identifier) -> Result<Vec<ContinuityNode>, PohwError>;
}

pub trait AttestorStore {
    fn put_attestor(&self, attestor: AttestorRecord) -> Result<(), PohwError>;
    fn get_attestor(&self, identifier: &Identifier) -> Result<Option<AttestorRecord>, PohwError>;
    fn list_attestors(&self) -> Result<Vec<AttestorRecord>, PohwError>;
    fn put_credential(&self, hash: ContentHash, credential: Credential) -> Result<(), PohwError>;
    fn get_credential(&self, hash: &ContentHash) -> Result<Option<Credential>, PohwError>;
    fn list_credentials_for_subject(&self, subject: &Identifier) -> Result<Vec<Credential>, PohwError>;
    fn put_revocation(&self, entry: RevocationEntry) -> Result<(), PohwError>;
    fn get_revocation(&self, credential_hash: &ContentHash) -> Result<Option<RevocationEntry>, PohwError>;
    fn list_revocations(&self) -> Result<Vec<RevocationEntry>, PohwError>;
}

pub trait AuditStore {
    fn append_audit(&self, entry: AuditEntry) -> Result<(), PohwError>;
    fn list_audit(&self, attestor_id: Option<&Identifier>, limit: usize) -> Result<Vec<AuditEntry>, PohwError>;
    fn put_reputation(&self, reputation: Reputation) -> Result<(), PohwError>;
    fn get_reputation(&self, identifier: &Identifier) -> Result<Option<Reputation>, PohwError>;
    fn list_reputation(&self) -> Result<Vec<Reputation>, PohwError>;
    fn append_submission(&self, record: SubmissionRecord) -> Result<(), PohwError>;
    fn list_submissions_since(&self, identifier: &Identifier, since: Timestamp) -> Result<Vec<SubmissionRecord>, PohwError>;
    fn append_anomaly(&self, record: AnomalyRecord) -> Result<(), PohwError>;
    fn list_anomalies(&self, identifier: &Identifier) -> Result<Vec<AnomalyRecord>, PohwError>;
}

pub trait DisputeStore {
    fn insert_challenge(&self, challenge: Challenge) -> Result<(), PohwError>;
    fn get_challenge(&self, id: &str) -> Result<Option<Challenge>, PohwError>;
    fn list_challenges_by_proof(&self, proof_hash: &ContentHash) -> Result<Vec<Challenge>, PohwError>;
    fn list_challenges_by_party(&self, identifier: &Identifier) -> Result<Vec<Challenge>, PohwError>;
    fn update_challenge(&self, challenge: Challenge) -> Result<(), PohwError>;
    fn append_transparency(&self, entry: TransparencyLogEntry) -> Result<(), PohwError>;
    fn list_transparency(&self, limit: usize) -> Result<Vec<TransparencyLogEntry>, PohwError>;
}
