//! Minimal JSON-RPC 2.0 client over `reqwest`: a raw HTTP POST shape rather
//! than pulling in a full JSON-RPC client crate.

use pohw_core::PohwError;

pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new() }
    }

    pub async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, PohwError> {
        let body = serde_json::json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 });

        let response = self.client.post(&self.url).json(&body).send().await.map_err(|e| PohwError::Transient {
            endpoint: self.url.clone(),
            detail: e.to_string(),
        })?;

        let json: serde_json::Value = response.json().await.map_err(|e| PohwError::Transient {
            endpoint: self.url.clone(),
            detail: format!("parsing RPC response: {e}"),
        })?;

        if let Some(error) = json.get("error") {
            return Err(PohwError::Transient { endpoint: self.url.clone(), detail: error.to_string() });
        }
        Ok(json["result"].clone())
    }
}
