//! Ethereum anchoring strategy (§4.9): self-send transaction whose `data`
//! field is a keccak256 commitment to the anchor payload.

use pohw_core::{
    constants::{ANCHOR_BROADCAST_BACKOFF_INITIAL_MS, ETHEREUM_GAS_ESTIMATE_MULTIPLIER, ETHEREUM_MIN_GAS_LIMIT, ETHEREUM_SAFE_DEFAULT_GAS_LIMIT},
    ChainKind, PohwError,
};

use crate::payload::{AnchorPayload, AnchorResult};
use crate::retry::retry_with_backoff;
use crate::rpc::JsonRpcClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasPricing {
    Eip1559 { max_fee_per_gas: u128, max_priority_fee_per_gas: u128 },
    Legacy { gas_price: u128 },
}

/// `gasLimit = max(21000, 1.2 * estimateGas(testTx))`, clamped to a safe
/// default of 50,000 when estimation is unavailable (§4.9).
pub fn derive_gas_limit(estimated: Option<u64>) -> u64 {
    match estimated {
        Some(estimate) => {
            let scaled = (estimate as f64 * ETHEREUM_GAS_ESTIMATE_MULTIPLIER).ceil() as u64;
            scaled.max(ETHEREUM_MIN_GAS_LIMIT)
        }
        None => ETHEREUM_SAFE_DEFAULT_GAS_LIMIT,
    }
}

pub struct EthereumAnchorStrategy {
    pub rpc: JsonRpcClient,
    pub address: String,
}

impl EthereumAnchorStrategy {
    async fn estimate_gas(&self, data_hex: &str) -> Option<u64> {
        let result = self
            .rpc
            .call("eth_estimateGas", serde_json::json!([{ "from": self.address, "to": self.address, "data": data_hex }]))
            .await
            .ok()?;
        let hex_str = result.as_str()?.trim_start_matches("0x");
        u64::from_str_radix(hex_str, 16).ok()
    }

    async fn gas_pricing(&self) -> GasPricing {
        if let Ok(fee_history) = self.rpc.call("eth_maxPriorityFeePerGas", serde_json::json!([])).await {
            if let Some(priority_hex) = fee_history.as_str() {
                if let Ok(priority) = u128::from_str_radix(priority_hex.trim_start_matches("0x"), 16) {
                    if let Ok(base) = self.rpc.call("eth_gasPrice", serde_json::json!([])).await {
                        if let Some(base_hex) = base.as_str() {
                            if let Ok(base_fee) = u128::from_str_radix(base_hex.trim_start_matches("0x"), 16) {
                                return GasPricing::Eip1559 { max_fee_per_gas: base_fee + priority, max_priority_fee_per_gas: priority };
                            }
                        }
                    }
                }
            }
        }
        let gas_price = self
            .rpc
            .call("eth_gasPrice", serde_json::json!([]))
            .await
            .ok()
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .and_then(|s| u128::from_str_radix(s.trim_start_matches("0x"), 16).ok())
            .unwrap_or(20_000_000_000);
        GasPricing::Legacy { gas_price }
    }

    pub async fn anchor(&self, payload: &AnchorPayload) -> AnchorResult {
        match self.try_anchor(payload).await {
            Ok(tx_hash) => AnchorResult { chain: ChainKind::Ethereum, tx_hash: Some(tx_hash), block_number: None, ok: true, error: None },
            Err(err) => AnchorResult { chain: ChainKind::Ethereum, tx_hash: None, block_number: None, ok: false, error: Some(err.to_string()) },
        }
    }

    async fn try_anchor(&self, payload: &AnchorPayload) -> Result<String, PohwError> {
        let commitment = payload.keccak_commitment();
        let data_hex = format!("0x{}", hex::encode(commitment));

        let estimated = self.estimate_gas(&data_hex).await;
        let gas_limit = derive_gas_limit(estimated);
        let pricing = self.gas_pricing().await;

        let mut tx = serde_json::json!({
            "from": self.address,
            "to": self.address,
            "data": data_hex,
            "gas": format!("0x{gas_limit:x}"),
        });
        match pricing {
            GasPricing::Eip1559 { max_fee_per_gas, max_priority_fee_per_gas } => {
                tx["maxFeePerGas"] = serde_json::json!(format!("0x{max_fee_per_gas:x}"));
                tx["maxPriorityFeePerGas"] = serde_json::json!(format!("0x{max_priority_fee_per_gas:x}"));
            }
            GasPricing::Legacy { gas_price } => {
                tx["gasPrice"] = serde_json::json!(format!("0x{gas_price:x}"));
            }
        }

        retry_with_backoff(ANCHOR_BROADCAST_BACKOFF_INITIAL_MS, || async {
            let result = self.rpc.call("eth_sendTransaction", serde_json::json!([tx])).await?;
            result
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| PohwError::StoreInconsistency("eth_sendTransaction returned non-string".into()))
        })
        .await
    }
}
