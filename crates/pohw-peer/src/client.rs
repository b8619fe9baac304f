//! Thin HTTP client for a peer's read-only sync surface (§4.10, §6: all
//! over HTTP GET, JSON bodies).

use pohw_core::{Batch, ContentHash, PohwError, ProofRecord, Signature, Timestamp};
use serde::{Deserialize, Serialize};

/// `MerkleRootExchange = (peerRegistryId, merkleRoot, batchId, timestamp, totalProofs, totalBatches, signature?)` (§4.10).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerkleRootExchange {
    pub peer_registry_id: String,
    pub merkle_root: ContentHash,
    pub batch_id: String,
    pub timestamp: Timestamp,
    pub total_proofs: u64,
    pub total_batches: u64,
    #[serde(default)]
    pub signature: Option<Signature>,
}

pub struct PeerClient {
    base_url: String,
    http: reqwest::Client,
}

impl PeerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: reqwest::Client::new() }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, PohwError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PohwError::Transient { endpoint: url.clone(), detail: e.to_string() })?;
        response
            .json::<T>()
            .await
            .map_err(|e| PohwError::Transient { endpoint: url, detail: format!("decoding response: {e}") })
    }

    pub async fn root_exchange(&self) -> Result<MerkleRootExchange, PohwError> {
        self.get("/v1/sync/root").await
    }

    pub async fn proofs_since(&self, total_proofs: u64) -> Result<Vec<ProofRecord>, PohwError> {
        self.get(&format!("/v1/sync/proofs?since={total_proofs}")).await
    }

    pub async fn batches(&self) -> Result<Vec<Batch>, PohwError> {
        self.get("/v1/sync/batches").await
    }
}
