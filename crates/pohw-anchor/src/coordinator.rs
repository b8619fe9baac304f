//! Anchor coordination (§4.9): runs every configured chain's strategy
//! independently and records whichever succeed.

use pohw_core::{Anchor, PohwError, Timestamp};
use pohw_store::{BatchStore, RegistryStore};

use crate::bitcoin::BitcoinAnchorStrategy;
use crate::ethereum::EthereumAnchorStrategy;
use crate::payload::AnchorPayload;

pub struct AnchorCoordinator {
    pub registry_id: String,
    pub bitcoin: Option<BitcoinAnchorStrategy>,
    pub ethereum: Option<EthereumAnchorStrategy>,
}

impl AnchorCoordinator {
    /// Anchor `batch_id` on every configured chain. A failure on one chain
    /// does not prevent the others from proceeding (§4.9 "error surfacing").
    /// An anchor is only recorded once the chain returns a txHash
    /// (§4.9 "idempotence"); re-anchoring an already-anchored batch simply
    /// appends another entry.
    pub async fn anchor_batch(&self, store: &RegistryStore, batch_id: &str, now: Timestamp) -> Result<Vec<AnchorOutcome>, PohwError> {
        let batch = store.get_batch(batch_id)?.ok_or_else(|| PohwError::BatchNotFound(batch_id.to_string()))?;
        let payload = AnchorPayload { root: batch.root, batch_id: batch_id.to_string(), registry_id: self.registry_id.clone(), anchored_at: now };

        let mut outcomes = Vec::new();
        let mut new_anchors = Vec::new();

        if let Some(bitcoin) = &self.bitcoin {
            let result = bitcoin.anchor(&payload).await;
            if result.ok {
                if let Some(tx_hash) = &result.tx_hash {
                    new_anchors.push(Anchor { chain: result.chain, tx_hash: tx_hash.clone(), block_number: result.block_number, anchored_at: now });
                }
            } else {
                tracing::warn!(batch_id, chain = "bitcoin", error = ?result.error, "anchor attempt failed");
            }
            outcomes.push(AnchorOutcome { chain: result.chain, ok: result.ok, tx_hash: result.tx_hash, error: result.error });
        }

        if let Some(ethereum) = &self.ethereum {
            let result = ethereum.anchor(&payload).await;
            if result.ok {
                if let Some(tx_hash) = &result.tx_hash {
                    new_anchors.push(Anchor { chain: result.chain, tx_hash: tx_hash.clone(), block_number: result.block_number, anchored_at: now });
                }
            } else {
                tracing::warn!(batch_id, chain = "ethereum", error = ?result.error, "anchor attempt failed");
            }
            outcomes.push(AnchorOutcome { chain: result.chain, ok: result.ok, tx_hash: result.tx_hash, error: result.error });
        }

        if !new_anchors.is_empty() {
            store.append_anchors(batch_id, new_anchors)?;
        }
        Ok(outcomes)
    }
}

#[derive(Clone, Debug)]
pub struct AnchorOutcome {
    pub chain: pohw_core::ChainKind,
    pub ok: bool,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}
