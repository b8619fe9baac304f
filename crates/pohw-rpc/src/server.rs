use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use pohw_anchor::AnchorCoordinator;
use pohw_core::{ContentHash, PohwError};
use pohw_intake::{IntakePipeline, SubmitOutcome};
use pohw_peer::PeerSyncHandle;
use pohw_store::{BatchStore, DisputeStore, ProofStore, RegistryStore};

use crate::api::PohwApiServer;
use crate::types::{RpcAnchor, RpcAnchorOutcome, RpcBatch, RpcChallenge, RpcInclusionProof, RpcProofRecord, RpcReceipt, RpcSubmitOutcome, RpcSubmitRequest};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Maps `PohwError` onto a JSON-RPC error object using the reason code as
/// a stable, machine-readable label (§7: "a short machine-readable reason
/// and a human-readable detail").
fn rpc_err_from(err: PohwError) -> ErrorObject<'static> {
    let code = match err.reason_code() {
        "validation_error" => -32602,
        "not_found_error" => -32001,
        "conflict_error" => -32010,
        "auth_error" => -32011,
        "rate_limit_error" => -32012,
        "backpressure_error" => -32013,
        _ => -32603,
    };
    ErrorObject::owned(code, err.to_string(), Some(err.reason_code()))
}

/// Shared state behind the JSON-RPC surface.
pub struct RpcServerState {
    pub store: Arc<RegistryStore>,
    pub intake: IntakePipeline,
    pub registry_id: String,
    pub registry_base_url: String,
    pub batch_size: usize,
    /// Present only when `anchoring.enabled` in the node's config (§10.3).
    pub anchor: Option<Arc<AnchorCoordinator>>,
    pub peer_sync: Option<Arc<PeerSyncHandle>>,
}

pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);
        let server = Server::builder().set_http_middleware(tower::ServiceBuilder::new().layer(cors)).build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "pohw-rpc JSON-RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl PohwApiServer for RpcServer {
    async fn get_proof(&self, content_hash: String) -> RpcResult<Option<RpcProofRecord>> {
        let hash = ContentHash::from_hex(&content_hash).map_err(|e| rpc_err(-32602, format!("invalid content hash: {e}")))?;
        let proof = self.state.store.get_proof_by_content_hash(&hash).map_err(rpc_err_from)?;
        Ok(proof.as_ref().map(RpcProofRecord::from))
    }

    async fn get_batch(&self, batch_id: String) -> RpcResult<Option<RpcBatch>> {
        let batch = self.state.store.get_batch(&batch_id).map_err(rpc_err_from)?;
        Ok(batch.as_ref().map(RpcBatch::from))
    }

    async fn get_inclusion_proof(&self, content_hash: String) -> RpcResult<Option<RpcInclusionProof>> {
        let hash = ContentHash::from_hex(&content_hash).map_err(|e| rpc_err(-32602, format!("invalid content hash: {e}")))?;
        let Some(proof) = self.state.store.get_proof_by_content_hash(&hash).map_err(rpc_err_from)? else { return Ok(None) };
        let Some(batch_id) = &proof.batch_id else { return Ok(None) };
        let batch = self.state.store.get_batch(batch_id).map_err(rpc_err_from)?.ok_or_else(|| rpc_err_from(PohwError::BatchNotFound(batch_id.clone())))?;
        let inclusion = pohw_batcher::inclusion_proof_for(&self.state.store, &hash).map_err(rpc_err_from)?;
        Ok(Some(RpcInclusionProof {
            proof: inclusion.iter().map(|h| h.to_hex()).collect(),
            root: batch.root.to_hex(),
            anchors: batch.anchors.iter().map(RpcAnchor::from).collect(),
        }))
    }

    async fn get_challenge(&self, challenge_id: String) -> RpcResult<Option<RpcChallenge>> {
        let challenge = self.state.store.get_challenge(&challenge_id).map_err(rpc_err_from)?;
        Ok(challenge.as_ref().map(RpcChallenge::from))
    }

    async fn get_claim(&self, content_hash: String) -> RpcResult<Option<serde_json::Value>> {
        let hash = ContentHash::from_hex(&content_hash).map_err(|e| rpc_err(-32602, format!("invalid content hash: {e}")))?;
        let Some(proof) = self.state.store.get_proof_by_content_hash(&hash).map_err(rpc_err_from)? else { return Ok(None) };

        let (inclusion_proof, anchors) = match &proof.batch_id {
            Some(batch_id) => {
                let batch = self.state.store.get_batch(batch_id).map_err(rpc_err_from)?.ok_or_else(|| rpc_err_from(PohwError::BatchNotFound(batch_id.clone())))?;
                let inclusion = pohw_batcher::inclusion_proof_for(&self.state.store, &hash).map_err(rpc_err_from)?;
                (inclusion, batch.anchors)
            }
            None => (vec![], vec![]),
        };
        let challenges = self.state.store.list_challenges_by_proof(&hash).map_err(rpc_err_from)?;

        let claim = pohw_claim::build_claim(pohw_claim::ClaimInputs {
            proof,
            inclusion_proof,
            anchors,
            challenges,
            registry_id: self.state.registry_id.clone(),
            registry_base_url: self.state.registry_base_url.clone(),
        });
        serde_json::to_value(&claim).map(Some).map_err(|e| rpc_err(-32603, e.to_string()))
    }

    async fn submit_attestation(&self, request: RpcSubmitRequest) -> RpcResult<RpcSubmitOutcome> {
        let domain_request = request.try_into_domain().map_err(|e| rpc_err(-32602, e))?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);

        match self.state.intake.submit(domain_request, now).map_err(rpc_err_from)? {
            SubmitOutcome::Accepted(receipt) => Ok(RpcSubmitOutcome { accepted: true, receipt: RpcReceipt::from(&receipt) }),
            SubmitOutcome::Duplicate(receipt) => {
                Err(ErrorObject::owned(-32010, "attestation with this content hash already exists", Some(serde_json::json!({ "reasonCode": "conflict_error", "receipt": RpcReceipt::from(&receipt) }))).into())
            }
        }
    }

    async fn request_batch(&self) -> RpcResult<Option<RpcBatch>> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
        let batch = pohw_batcher::drain_batch(&self.state.store, now, self.state.batch_size).map_err(rpc_err_from)?;
        Ok(batch.as_ref().map(RpcBatch::from))
    }

    async fn request_anchor(&self, batch_id: String) -> RpcResult<Vec<RpcAnchorOutcome>> {
        let coordinator = self.state.anchor.as_ref().ok_or_else(|| rpc_err(-32603, "anchoring is not enabled on this registry"))?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
        let outcomes = coordinator.anchor_batch(&self.state.store, &batch_id, now).await.map_err(rpc_err_from)?;
        Ok(outcomes.iter().map(RpcAnchorOutcome::from).collect())
    }

    async fn request_sync(&self) -> RpcResult<bool> {
        let handle = self.state.peer_sync.as_ref().ok_or_else(|| rpc_err(-32603, "no peers configured on this registry"))?;
        handle.trigger_sync().await;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pohw_core::{Identifier, VerificationMethod};
    use pohw_crypto::KeyPair;
    use pohw_store::db::temp_store_for_tests;

    fn registered_author(store: &RegistryStore, id: &str) -> (Identifier, KeyPair) {
        let identifier = Identifier::parse(id).unwrap();
        let kp = KeyPair::generate();
        pohw_identity::register_identifier(store, identifier.clone(), vec![VerificationMethod { key: kp.public_key.clone(), created_at: 0 }], 0).unwrap();
        (identifier, kp)
    }

    fn server_over(store: Arc<RegistryStore>) -> RpcServer {
        let intake = IntakePipeline::new(Arc::clone(&store), "registry-test");
        RpcServer::new(Arc::new(RpcServerState {
            store,
            intake,
            registry_id: "registry-test".into(),
            registry_base_url: "https://registry.example".into(),
            batch_size: 1000,
            anchor: None,
            peer_sync: None,
        }))
    }

    #[tokio::test]
    async fn get_proof_returns_none_for_unknown_hash() {
        let store = Arc::new(temp_store_for_tests("rpc_get_proof_unknown"));
        let server = server_over(store);
        let result = server.get_proof("00".repeat(32)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn submit_then_get_round_trips_over_the_wire() {
        let store = Arc::new(temp_store_for_tests("rpc_submit_roundtrip"));
        let (id, kp) = registered_author(&store, "did:pohw:alice");
        let server = server_over(store);

        let content_hash = ContentHash::from_bytes([0x11; 32]);
        let message = pohw_crypto::canonicalize(&content_hash, &id, 100);
        let signature = kp.sign(&message);

        let request = RpcSubmitRequest {
            content_hash: content_hash.to_hex(),
            signature: hex::encode(&signature.0),
            author_id: id.as_str().to_string(),
            author_timestamp: 100,
            process_metrics: None,
            zk_proof_blob: None,
            authored_on_device: None,
            environment_attestation: None,
            derived_from_refs: vec![],
            assistance_profile: Some("humanOnly".to_string()),
            claim_uri: None,
        };

        let outcome = server.submit_attestation(request).await.unwrap();
        assert!(outcome.accepted);

        let fetched = server.get_proof(content_hash.to_hex()).await.unwrap().unwrap();
        assert_eq!(fetched.content_hash, content_hash.to_hex());
        assert_eq!(fetched.assistance_profile.as_deref(), Some("humanOnly"));
    }

    #[tokio::test]
    async fn duplicate_submission_surfaces_as_a_conflict_error() {
        let store = Arc::new(temp_store_for_tests("rpc_submit_conflict"));
        let (id, kp) = registered_author(&store, "did:pohw:bob");
        let server = server_over(store);

        let content_hash = ContentHash::from_bytes([0x22; 32]);
        let message = pohw_crypto::canonicalize(&content_hash, &id, 100);
        let signature = kp.sign(&message);
        let make_request = || RpcSubmitRequest {
            content_hash: content_hash.to_hex(),
            signature: hex::encode(&signature.0),
            author_id: id.as_str().to_string(),
            author_timestamp: 100,
            process_metrics: None,
            zk_proof_blob: None,
            authored_on_device: None,
            environment_attestation: None,
            derived_from_refs: vec![],
            assistance_profile: Some("humanOnly".to_string()),
            claim_uri: None,
        };

        server.submit_attestation(make_request()).await.unwrap();
        let err = server.submit_attestation(make_request()).await.unwrap_err();
        assert_eq!(err.code(), -32010);
    }

    #[tokio::test]
    async fn get_inclusion_proof_is_none_before_batching() {
        let store = Arc::new(temp_store_for_tests("rpc_inclusion_none"));
        let (id, kp) = registered_author(&store, "did:pohw:carol");
        let server = server_over(store);

        let content_hash = ContentHash::from_bytes([0x33; 32]);
        let message = pohw_crypto::canonicalize(&content_hash, &id, 100);
        let signature = kp.sign(&message);
        server
            .submit_attestation(RpcSubmitRequest {
                content_hash: content_hash.to_hex(),
                signature: hex::encode(&signature.0),
                author_id: id.as_str().to_string(),
                author_timestamp: 100,
                process_metrics: None,
                zk_proof_blob: None,
                authored_on_device: None,
                environment_attestation: None,
                derived_from_refs: vec![],
                assistance_profile: Some("humanOnly".to_string()),
                claim_uri: None,
            })
            .await
            .unwrap();

        let inclusion = server.get_inclusion_proof(content_hash.to_hex()).await.unwrap();
        assert!(inclusion.is_none());
    }

    #[tokio::test]
    async fn request_batch_drains_pending_proofs() {
        let store = Arc::new(temp_store_for_tests("rpc_request_batch"));
        let (id, kp) = registered_author(&store, "did:pohw:dora");
        let server = server_over(store);

        let content_hash = ContentHash::from_bytes([0x44; 32]);
        let message = pohw_crypto::canonicalize(&content_hash, &id, 100);
        let signature = kp.sign(&message);
        server
            .submit_attestation(RpcSubmitRequest {
                content_hash: content_hash.to_hex(),
                signature: hex::encode(&signature.0),
                author_id: id.as_str().to_string(),
                author_timestamp: 100,
                process_metrics: None,
                zk_proof_blob: None,
                authored_on_device: None,
                environment_attestation: None,
                derived_from_refs: vec![],
                assistance_profile: Some("humanOnly".to_string()),
                claim_uri: None,
            })
            .await
            .unwrap();

        let batch = server.request_batch().await.unwrap().unwrap();
        assert_eq!(batch.size, 1);
        assert!(server.request_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn request_anchor_without_anchoring_configured_errors() {
        let store = Arc::new(temp_store_for_tests("rpc_request_anchor_disabled"));
        let server = server_over(store);
        let err = server.request_anchor("0xabc".into()).await.unwrap_err();
        assert_eq!(err.code(), -32603);
    }

    #[tokio::test]
    async fn request_sync_without_peers_configured_errors() {
        let store = Arc::new(temp_store_for_tests("rpc_request_sync_disabled"));
        let server = server_over(store);
        let err = server.request_sync().await.unwrap_err();
        assert_eq!(err.code(), -32603);
    }
}
