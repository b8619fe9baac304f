use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcAnchorOutcome, RpcBatch, RpcChallenge, RpcInclusionProof, RpcProofRecord, RpcSubmitOutcome, RpcSubmitRequest};

/// Registry JSON-RPC 2.0 API. Methods are prefixed `pohw_` via `namespace = "pohw"`
/// (§10.5: "a thin adapter over the C1-C12 components, not a reimplementation").
#[rpc(server, namespace = "pohw")]
pub trait PohwApi {
    /// Look up a proof by its content hash (hex, with or without `0x`).
    #[method(name = "getProof")]
    async fn get_proof(&self, content_hash: String) -> RpcResult<Option<RpcProofRecord>>;

    /// Look up a batch by id.
    #[method(name = "getBatch")]
    async fn get_batch(&self, batch_id: String) -> RpcResult<Option<RpcBatch>>;

    /// Inclusion proof for a content hash already assigned to a batch.
    #[method(name = "getInclusionProof")]
    async fn get_inclusion_proof(&self, content_hash: String) -> RpcResult<Option<RpcInclusionProof>>;

    /// Look up a dispute by challenge id.
    #[method(name = "getChallenge")]
    async fn get_challenge(&self, challenge_id: String) -> RpcResult<Option<RpcChallenge>>;

    /// Assemble the canonical signed claim object for a content hash (§4.12).
    /// Returned as JSON-LD-shaped raw JSON; field names are the wire contract.
    #[method(name = "getClaim")]
    async fn get_claim(&self, content_hash: String) -> RpcResult<Option<serde_json::Value>>;

    /// Submit a new attestation (§4.7).
    #[method(name = "submitAttestation")]
    async fn submit_attestation(&self, request: RpcSubmitRequest) -> RpcResult<RpcSubmitOutcome>;

    /// Operator-requested immediate batch drain (§4.8 "explicit operator
    /// request"). Returns `null` when nothing was pending.
    #[method(name = "requestBatch")]
    async fn request_batch(&self) -> RpcResult<Option<RpcBatch>>;

    /// Operator-requested anchor for an already-drained batch (§4.9).
    #[method(name = "requestAnchor")]
    async fn request_anchor(&self, batch_id: String) -> RpcResult<Vec<RpcAnchorOutcome>>;

    /// Operator-requested immediate, out-of-cycle peer sync (§4.10 "on
    /// demand"). Fire-and-forget: returns once the request is queued, not
    /// once the sync cycle completes.
    #[method(name = "requestSync")]
    async fn request_sync(&self) -> RpcResult<bool>;
}
