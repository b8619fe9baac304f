use anyhow::{bail, Context};

/// Minimal JSON-RPC 2.0 client used by the CLI to talk to a running registry
/// node. Raw HTTP POST over `reqwest` rather than the full `jsonrpsee` client,
/// to keep the operator binary lean.
pub struct RegistryRpcClient {
    url: String,
    client: reqwest::Client,
}

impl RegistryRpcClient {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string(), client: reqwest::Client::new() }
    }

    /// Call a JSON-RPC method and return the `result` field.
    async fn call(&self, method: &str, params: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to registry node at {}", self.url))?;

        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            bail!("RPC error: {}", err);
        }

        Ok(json["result"].clone())
    }

    pub async fn get_proof(&self, content_hash: &str) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_getProof", serde_json::json!([content_hash])).await
    }

    pub async fn get_batch(&self, batch_id: &str) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_getBatch", serde_json::json!([batch_id])).await
    }

    pub async fn get_inclusion_proof(&self, content_hash: &str) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_getInclusionProof", serde_json::json!([content_hash])).await
    }

    pub async fn get_challenge(&self, challenge_id: &str) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_getChallenge", serde_json::json!([challenge_id])).await
    }

    pub async fn get_claim(&self, content_hash: &str) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_getClaim", serde_json::json!([content_hash])).await
    }

    pub async fn submit_attestation(&self, request: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_submitAttestation", serde_json::json!([request])).await
    }

    /// Request an immediate batch drain. `null` result means nothing was pending.
    pub async fn request_batch(&self) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_requestBatch", serde_json::json!([])).await
    }

    pub async fn request_anchor(&self, batch_id: &str) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_requestAnchor", serde_json::json!([batch_id])).await
    }

    pub async fn request_sync(&self) -> anyhow::Result<serde_json::Value> {
        self.call("pohw_requestSync", serde_json::json!([])).await
    }
}
