//! Bitcoin anchoring strategy (§4.9): OP_RETURN commitment, smallest-first
//! UTXO selection, RPC-first with block-explorer fallback for reads.

use pohw_core::{
    constants::{
        BITCOIN_DUST_LIMIT_SATS, BITCOIN_FALLBACK_FEE_MAINNET, BITCOIN_FALLBACK_FEE_TESTNET, BITCOIN_FEE_BUFFER_SATS,
        ANCHOR_BROADCAST_BACKOFF_INITIAL_MS, ANCHOR_READ_BACKOFF_INITIAL_MS,
    },
    ChainKind, PohwError,
};

use crate::payload::{AnchorPayload, AnchorResult};
use crate::retry::retry_with_backoff;
use crate::rpc::JsonRpcClient;

/// Rough size estimate for a 1-input, 2-output (OP_RETURN + change) P2WPKH
/// transaction, in vbytes. Good enough for fee-buffer sizing; the node's own
/// `fundrawtransaction` performs the authoritative calculation.
const ESTIMATED_TX_VBYTES: u64 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitcoinNetwork {
    Mainnet,
    Testnet,
}

impl BitcoinNetwork {
    fn fallback_fee_rate(self) -> u64 {
        match self {
            BitcoinNetwork::Mainnet => BITCOIN_FALLBACK_FEE_MAINNET,
            BitcoinNetwork::Testnet => BITCOIN_FALLBACK_FEE_TESTNET,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub value_sats: u64,
}

/// Smallest-first selection until `target_sats` is covered with a
/// `buffer_sats` safety margin (§4.9). Pure and independently testable.
pub fn select_utxos(utxos: &[Utxo], target_sats: u64, buffer_sats: u64) -> Result<(Vec<Utxo>, u64), PohwError> {
    let mut ordered: Vec<&Utxo> = utxos.iter().collect();
    ordered.sort_by_key(|u| u.value_sats);

    let needed = target_sats.saturating_add(buffer_sats);
    let mut selected = Vec::new();
    let mut total = 0u64;
    for utxo in ordered {
        if total >= needed {
            break;
        }
        selected.push(utxo.clone());
        total += utxo.value_sats;
    }

    if total < needed {
        return Err(PohwError::Anchor {
            chain: "bitcoin".into(),
            detail: format!("insufficient funds: have {total} sats, need {needed} sats"),
            funding_hint: Some("fund the anchor wallet's source address and retry".into()),
            retryable: false,
        });
    }
    Ok((selected, total))
}

/// Change remaining after fee, dropped entirely (added to fee) when it would
/// be dust (§4.9).
pub fn change_after_fee(selected_sats: u64, fee_sats: u64) -> Option<u64> {
    let change = selected_sats.saturating_sub(fee_sats);
    if change > BITCOIN_DUST_LIMIT_SATS {
        Some(change)
    } else {
        None
    }
}

pub struct BitcoinAnchorStrategy {
    pub network: BitcoinNetwork,
    pub node_rpc: Option<JsonRpcClient>,
    pub explorer_base_url: Option<String>,
    pub source_address: String,
    /// The same key's other address form (P2PKH vs. P2WPKH/Bech32), tried
    /// for UTXO discovery when `source_address` comes up empty (§4.9).
    pub source_address_alt: Option<String>,
    pub http: reqwest::Client,
}

impl BitcoinAnchorStrategy {
    async fn estimate_fee_rate_sat_per_byte(&self) -> u64 {
        if let Some(rpc) = &self.node_rpc {
            if let Ok(result) = rpc.call("estimatesmartfee", serde_json::json!([6])).await {
                if let Some(btc_per_kvb) = result.get("feerate").and_then(|v| v.as_f64()) {
                    let sat_per_byte = (btc_per_kvb * 100_000_000.0 / 1000.0).ceil() as u64;
                    if sat_per_byte > 0 {
                        return sat_per_byte;
                    }
                }
            }
        }
        self.network.fallback_fee_rate()
    }

    /// Tries `source_address` first, falling back to `source_address_alt`
    /// (the same key's other P2PKH/P2WPKH form) when discovery on the
    /// primary address fails or turns up no UTXOs (§4.9).
    async fn fetch_utxos(&self) -> Result<Vec<Utxo>, PohwError> {
        let primary = self.fetch_utxos_for(&self.source_address).await;
        if let Ok(utxos) = &primary {
            if !utxos.is_empty() {
                return primary;
            }
        }
        let Some(alt) = &self.source_address_alt else {
            return primary;
        };
        match self.fetch_utxos_for(alt).await {
            Ok(utxos) if !utxos.is_empty() => Ok(utxos),
            alt_result => primary.or(alt_result),
        }
    }

    async fn fetch_utxos_for(&self, address: &str) -> Result<Vec<Utxo>, PohwError> {
        if let Some(rpc) = &self.node_rpc {
            let result = rpc.call("listunspent", serde_json::json!([0, 9_999_999, [address]])).await?;
            if let Some(entries) = result.as_array() {
                return Ok(entries
                    .iter()
                    .filter_map(|entry| {
                        Some(Utxo {
                            txid: entry.get("txid")?.as_str()?.to_string(),
                            vout: entry.get("vout")?.as_u64()? as u32,
                            value_sats: (entry.get("amount")?.as_f64()? * 100_000_000.0).round() as u64,
                        })
                    })
                    .collect());
            }
        }
        if let Some(base) = &self.explorer_base_url {
            let url = format!("{base}/address/{address}/utxo");
            let entries: Vec<serde_json::Value> = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| PohwError::Transient { endpoint: url.clone(), detail: e.to_string() })?
                .json()
                .await
                .map_err(|e| PohwError::Transient { endpoint: url, detail: e.to_string() })?;
            return Ok(entries
                .iter()
                .filter_map(|entry| {
                    Some(Utxo {
                        txid: entry.get("txid")?.as_str()?.to_string(),
                        vout: entry.get("vout")?.as_u64()? as u32,
                        value_sats: entry.get("value")?.as_u64()?,
                    })
                })
                .collect());
        }
        Err(PohwError::Anchor {
            chain: "bitcoin".into(),
            detail: "no RPC or explorer transport configured".into(),
            funding_hint: None,
            retryable: false,
        })
    }

    /// Build, fund, sign and broadcast via node wallet RPC (§4.9). The node's
    /// own wallet holds the signing key — this strategy never handles raw
    /// secp256k1 key material.
    async fn broadcast_via_node(&self, op_return_hex: &str, change_sats: Option<u64>) -> Result<String, PohwError> {
        let rpc = self.node_rpc.as_ref().ok_or_else(|| PohwError::Transient {
            endpoint: "bitcoin-node".into(),
            detail: "no node RPC configured for broadcast".into(),
        })?;

        let mut outputs = serde_json::json!([{ "data": op_return_hex }]);
        if let Some(change) = change_sats {
            outputs.as_array_mut().unwrap().push(serde_json::json!({ self.source_address: (change as f64) / 100_000_000.0 }));
        }
        let raw = rpc.call("createrawtransaction", serde_json::json!([[], outputs])).await?;
        let raw_hex = raw.as_str().ok_or_else(|| PohwError::StoreInconsistency("createrawtransaction returned non-string".into()))?;

        let funded = rpc.call("fundrawtransaction", serde_json::json!([raw_hex])).await?;
        let funded_hex = funded
            .get("hex")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PohwError::StoreInconsistency("fundrawtransaction missing hex".into()))?;

        let signed = rpc.call("signrawtransactionwithwallet", serde_json::json!([funded_hex])).await?;
        let signed_hex = signed
            .get("hex")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PohwError::StoreInconsistency("signrawtransactionwithwallet missing hex".into()))?;

        let txid = rpc.call("sendrawtransaction", serde_json::json!([signed_hex])).await?;
        txid.as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| PohwError::StoreInconsistency("sendrawtransaction returned non-string".into()))
    }

    pub async fn anchor(&self, payload: &AnchorPayload) -> AnchorResult {
        match self.try_anchor(payload).await {
            Ok(tx_hash) => AnchorResult { chain: ChainKind::Bitcoin, tx_hash: Some(tx_hash), block_number: None, ok: true, error: None },
            Err(err) => AnchorResult { chain: ChainKind::Bitcoin, tx_hash: None, block_number: None, ok: false, error: Some(err.to_string()) },
        }
    }

    async fn try_anchor(&self, payload: &AnchorPayload) -> Result<String, PohwError> {
        let commitment = payload.op_return_commitment();
        let op_return_hex = hex::encode(&commitment);

        let utxos = retry_with_backoff(ANCHOR_READ_BACKOFF_INITIAL_MS, || self.fetch_utxos()).await?;
        let fee_rate = self.estimate_fee_rate_sat_per_byte().await;
        let fee_sats = ESTIMATED_TX_VBYTES * fee_rate;
        let (_selected, total_sats) = select_utxos(&utxos, fee_sats, BITCOIN_FEE_BUFFER_SATS)?;
        let change_sats = change_after_fee(total_sats, fee_sats);

        retry_with_backoff(ANCHOR_BROADCAST_BACKOFF_INITIAL_MS, || self.broadcast_via_node(&op_return_hex, change_sats)).await
    }
}
