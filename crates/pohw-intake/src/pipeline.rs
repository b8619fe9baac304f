//! Intake pipeline (§4.7): validate → verify → dedupe → rate-limit/reputation
//! gate → tier-resolve → persist → receipt. Every precondition is checked in
//! order before a single commit, and any rejection leaves the store
//! untouched.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use pohw_core::{
    constants::{DEFAULT_BATCH_SIZE, DEFAULT_ENTROPY_TOLERANCE, DEFAULT_MAX_PENDING, DEFAULT_RATE_LIMIT_PER_HOUR},
    AssistanceProfile, ContentHash, DerivedFromRef, Identifier, PohwError, ProcessMetrics, ProofRecord, Signature, Timestamp,
};
use pohw_store::{AuditStore, IdentityStore, ProofStore, RegistryStore};

use crate::receipt::Receipt;

/// Raw, not-yet-validated submission (§3, §4.7).
pub struct SubmitRequest {
    pub content_hash: ContentHash,
    pub signature: Signature,
    pub author_id: Identifier,
    pub author_timestamp: Timestamp,
    pub process_metrics: Option<ProcessMetrics>,
    pub zk_proof_blob: Option<Vec<u8>>,
    pub authored_on_device: Option<String>,
    pub environment_attestation: Option<String>,
    pub derived_from_refs: Vec<DerivedFromRef>,
    pub assistance_profile: Option<AssistanceProfile>,
    pub claim_uri: Option<String>,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// A new proof record was persisted.
    Accepted(Receipt),
    /// A proof with this content hash already existed; nothing was written
    /// (§4.7: "respond 409-equivalent ... no write").
    Duplicate(Receipt),
}

pub struct IntakePipeline {
    /// Shared with the batcher/anchor/peer-sync/RPC components, the same way
    /// the host's node binary shares one `Arc<StateDb>` across its engine,
    /// RPC server and P2P worker.
    pub store: Arc<RegistryStore>,
    pub registry_id: String,
    pub max_pending: usize,
    pub batch_size: usize,
    pub rate_limit_per_hour: u32,
    pub entropy_tolerance: f64,
    /// Fired after a successful insert once the pending count reaches
    /// `batch_size` — a cooperative nudge for the batcher, not a guarantee
    /// (§4.7 "post-insert hook").
    pub batch_signal: Option<Sender<()>>,
}

impl IntakePipeline {
    pub fn new(store: Arc<RegistryStore>, registry_id: impl Into<String>) -> Self {
        Self {
            store,
            registry_id: registry_id.into(),
            max_pending: DEFAULT_MAX_PENDING,
            batch_size: DEFAULT_BATCH_SIZE,
            rate_limit_per_hour: DEFAULT_RATE_LIMIT_PER_HOUR,
            entropy_tolerance: DEFAULT_ENTROPY_TOLERANCE,
            batch_signal: None,
        }
    }

    pub fn submit(&self, request: SubmitRequest, now: Timestamp) -> Result<SubmitOutcome, PohwError> {
        // ── 1. Input validation ────────────────────────────────────────────
        if request.signature.0.is_empty() {
            return Err(PohwError::Validation("signature must not be empty".into()));
        }
        if request.author_timestamp <= 0 {
            return Err(PohwError::Validation("authorTimestamp must be a positive unix timestamp".into()));
        }

        // ── 2. Backpressure ──────────────────────────────────────────────────
        let pending = self.store.count_pending_proofs()?;
        if pending >= self.max_pending as u64 {
            return Err(PohwError::Backpressure { pending, max: self.max_pending as u64 });
        }

        // ── 3. Signature verification ───────────────────────────────────────
        let document = self
            .store
            .get_document(&request.author_id)?
            .ok_or_else(|| PohwError::IdentifierNotFound(request.author_id.as_str().to_string()))?;
        let message = pohw_crypto::canonicalize(&request.content_hash, &request.author_id, request.author_timestamp);
        let verifies = document
            .verification_methods
            .iter()
            .any(|vm| pohw_crypto::verify(&vm.key, &message, &request.signature).is_ok());
        if !verifies {
            return Err(PohwError::InvalidSignature);
        }

        // ── 4. Duplicate check (only after the submitter is authenticated) ──
        if let Some(existing) = self.store.get_proof_by_content_hash(&request.content_hash)? {
            let receipt_hash = pohw_crypto::receipt_hash(&existing.content_hash, &existing.author_id, existing.author_timestamp);
            return Ok(SubmitOutcome::Duplicate(Receipt { receipt_hash, timestamp: now, registry_id: self.registry_id.clone() }));
        }

        // ── 5. Rate-limit gate ───────────────────────────────────────────────
        if let Err(err) = pohw_fraud::check_rate_limit(&self.store, &request.author_id, now, self.rate_limit_per_hour) {
            pohw_fraud::record_anomaly(&self.store, &request.author_id, now, "rate_limit", &err.to_string())?;
            return Err(err);
        }

        // ── 6. Entropy-discrepancy check (flags, does not reject) ───────────
        if let Some(metrics) = &request.process_metrics {
            if let Some(entropy) = metrics.entropy {
                if let Some(detail) = pohw_fraud::check_entropy_discrepancy(&self.store, &request.author_id, entropy, self.entropy_tolerance)? {
                    tracing::warn!(identifier = %request.author_id, %detail, "entropy discrepancy flagged");
                    pohw_fraud::record_anomaly(&self.store, &request.author_id, now, "entropy_discrepancy", &detail)?;
                }
            }
        }

        // ── 7. Assistance-profile + tier resolution ─────────────────────────
        let assistance_profile = request.assistance_profile.unwrap_or_else(|| resolve_assistance_profile(&request.process_metrics));
        let tier = pohw_attestation::derive_tier(&self.store, &request.author_id, assistance_profile, now)?;

        // ── 8. Process digest / compound hash ───────────────────────────────
        let process_digest = request
            .process_metrics
            .as_ref()
            .map(|metrics| pohw_core::hash(&bincode::serialize(metrics).unwrap_or_default()));
        let compound_hash = process_digest.map(|digest| pohw_crypto::compound_hash(&request.content_hash, &digest));

        // ── 9. Persist ───────────────────────────────────────────────────────
        let proof = ProofRecord {
            content_hash: request.content_hash,
            signature: request.signature,
            author_id: request.author_id.clone(),
            author_timestamp: request.author_timestamp,
            submitted_at: now,
            batch_id: None,
            merkle_index: None,
            process_digest,
            compound_hash,
            process_metrics: request.process_metrics.clone(),
            zk_proof_blob: request.zk_proof_blob,
            tier,
            authored_on_device: request.authored_on_device,
            environment_attestation: request.environment_attestation,
            derived_from_refs: request.derived_from_refs,
            assistance_profile: Some(assistance_profile),
            claim_uri: request.claim_uri,
        };
        self.store.insert_proof(proof)?;
        self.store.append_submission(pohw_core::SubmissionRecord {
            identifier: request.author_id.clone(),
            at: now,
            entropy: request.process_metrics.and_then(|m| m.entropy),
        })?;
        pohw_fraud::record_successful_proof(&self.store, &request.author_id, now)?;

        // ── 10. Post-insert batch-threshold hook ────────────────────────────
        if self.store.count_pending_proofs()? >= self.batch_size as u64 {
            if let Some(signal) = &self.batch_signal {
                let _ = signal.send(());
            }
        }

        let receipt_hash = pohw_crypto::receipt_hash(&request.content_hash, &request.author_id, request.author_timestamp);
        Ok(SubmitOutcome::Accepted(Receipt { receipt_hash, timestamp: now, registry_id: self.registry_id.clone() }))
    }
}

/// Derive assistance profile from process metrics when the submitter didn't
/// supply one explicitly (§4.7).
fn resolve_assistance_profile(metrics: &Option<ProcessMetrics>) -> AssistanceProfile {
    let Some(metrics) = metrics else {
        return AssistanceProfile::AiAssisted;
    };
    if metrics.meets_thresholds == Some(true) {
        return AssistanceProfile::HumanOnly;
    }
    let looks_generated = metrics.entropy.map(|e| e < 0.1).unwrap_or(false)
        && metrics.duration_ms.map(|d| d < 5_000).unwrap_or(false)
        && metrics.input_events.map(|e| e < 5).unwrap_or(false);
    if looks_generated {
        AssistanceProfile::AiGenerated
    } else {
        AssistanceProfile::AiAssisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pohw_core::VerificationMethod;
    use pohw_crypto::KeyPair;
    use pohw_store::db::temp_store_for_tests as temp_store;

    fn registered_author(store: &RegistryStore, id: &str) -> (Identifier, KeyPair) {
        let identifier = Identifier::parse(id).unwrap();
        let kp = KeyPair::generate();
        pohw_identity::register_identifier(store, identifier.clone(), vec![VerificationMethod { key: kp.public_key.clone(), created_at: 0 }], 0).unwrap();
        (identifier, kp)
    }

    fn sign_request(kp: &KeyPair, identifier: &Identifier, content_hash: ContentHash, author_timestamp: Timestamp) -> SubmitRequest {
        let message = pohw_crypto::canonicalize(&content_hash, identifier, author_timestamp);
        SubmitRequest {
            content_hash,
            signature: kp.sign(&message),
            author_id: identifier.clone(),
            author_timestamp,
            process_metrics: None,
            zk_proof_blob: None,
            authored_on_device: None,
            environment_attestation: None,
            derived_from_refs: vec![],
            assistance_profile: Some(AssistanceProfile::HumanOnly),
            claim_uri: None,
        }
    }

    fn pipeline_over(store: RegistryStore) -> IntakePipeline {
        IntakePipeline::new(Arc::new(store), "registry-test")
    }

    #[test]
    fn accepts_a_well_formed_submission() {
        let store = temp_store("intake_accept");
        let (id, kp) = registered_author(&store, "did:pohw:alice");
        let pipeline = pipeline_over(store);
        let request = sign_request(&kp, &id, ContentHash::from_bytes([0x01; 32]), 100);
        let outcome = pipeline.submit(request, 100).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
    }

    #[test]
    fn rejects_tampered_signature() {
        let store = temp_store("intake_bad_sig");
        let (id, kp) = registered_author(&store, "did:pohw:alice");
        let pipeline = pipeline_over(store);
        let mut request = sign_request(&kp, &id, ContentHash::from_bytes([0x02; 32]), 100);
        request.signature.0[0] ^= 0xFF;
        let err = pipeline.submit(request, 100).unwrap_err();
        assert!(matches!(err, PohwError::InvalidSignature));
    }

    #[test]
    fn duplicate_submission_returns_existing_receipt_without_write() {
        let store = temp_store("intake_duplicate");
        let (id, kp) = registered_author(&store, "did:pohw:alice");
        let pipeline = pipeline_over(store);
        let hash = ContentHash::from_bytes([0x03; 32]);
        let first = pipeline.submit(sign_request(&kp, &id, hash, 100), 100).unwrap();
        assert!(matches!(first, SubmitOutcome::Accepted(_)));
        let second = pipeline.submit(sign_request(&kp, &id, hash, 100), 101).unwrap();
        assert!(matches!(second, SubmitOutcome::Duplicate(_)));
        assert_eq!(pipeline.store.count_total_proofs().unwrap(), 1);
    }

    #[test]
    fn forged_signature_against_an_existing_content_hash_is_rejected_not_leaked_as_duplicate() {
        let store = temp_store("intake_duplicate_forged_sig");
        let (id, kp) = registered_author(&store, "did:pohw:alice");
        let pipeline = pipeline_over(store);
        let hash = ContentHash::from_bytes([0x05; 32]);
        let first = pipeline.submit(sign_request(&kp, &id, hash, 100), 100).unwrap();
        assert!(matches!(first, SubmitOutcome::Accepted(_)));

        let mut forged = sign_request(&kp, &id, hash, 100);
        forged.signature.0[0] ^= 0xFF;
        let err = pipeline.submit(forged, 101).unwrap_err();
        assert!(matches!(err, PohwError::InvalidSignature));
    }

    #[test]
    fn unregistered_author_is_rejected() {
        let store = temp_store("intake_unknown_author");
        let pipeline = pipeline_over(store);
        let kp = KeyPair::generate();
        let id = Identifier::parse("did:pohw:ghost").unwrap();
        let request = sign_request(&kp, &id, ContentHash::from_bytes([0x04; 32]), 100);
        let err = pipeline.submit(request, 100).unwrap_err();
        assert!(matches!(err, PohwError::IdentifierNotFound(_)));
    }

    #[test]
    fn rate_limit_is_enforced() {
        let store = temp_store("intake_rate_limit");
        let (id, kp) = registered_author(&store, "did:pohw:alice");
        let mut pipeline = pipeline_over(store);
        pipeline.rate_limit_per_hour = 2;
        for i in 0..2u8 {
            let hash = ContentHash::from_bytes([0x10 + i; 32]);
            pipeline.submit(sign_request(&kp, &id, hash, 100), 100).unwrap();
        }
        let hash = ContentHash::from_bytes([0x20; 32]);
        let err = pipeline.submit(sign_request(&kp, &id, hash, 100), 100).unwrap_err();
        assert!(matches!(err, PohwError::RateLimit { .. }));
    }

    #[test]
    fn backpressure_triggers_past_max_pending() {
        let store = temp_store("intake_backpressure");
        let (id, kp) = registered_author(&store, "did:pohw:alice");
        let mut pipeline = pipeline_over(store);
        pipeline.max_pending = 1;
        pipeline.rate_limit_per_hour = 1000;
        pipeline.submit(sign_request(&kp, &id, ContentHash::from_bytes([0x30; 32]), 100), 100).unwrap();
        let err = pipeline.submit(sign_request(&kp, &id, ContentHash::from_bytes([0x31; 32]), 100), 100).unwrap_err();
        assert!(matches!(err, PohwError::Backpressure { .. }));
    }
}
