//! Anchor payload construction (§4.9): `(root, batchId, registryId, anchoredAt)`.

use pohw_core::{ContentHash, Timestamp};

#[derive(Clone, Debug)]
pub struct AnchorPayload {
    pub root: ContentHash,
    pub batch_id: String,
    pub registry_id: String,
    pub anchored_at: Timestamp,
}

impl AnchorPayload {
    /// Length-prefixed canonical bytes, the same assembly style used for
    /// every other signed/hashed value in the registry.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.root.as_bytes());
        buf.extend_from_slice(&(self.batch_id.len() as u32).to_be_bytes());
        buf.extend_from_slice(self.batch_id.as_bytes());
        buf.extend_from_slice(&(self.registry_id.len() as u32).to_be_bytes());
        buf.extend_from_slice(self.registry_id.as_bytes());
        buf.extend_from_slice(&self.anchored_at.to_be_bytes());
        buf
    }

    /// Bitcoin's `OP_RETURN` budget is 80 bytes (§4.9, §6). The wire format is
    /// UTF-8 JSON of `{pohw, root, batch, registry, timestamp}`, truncated
    /// (not rejected) when it would exceed the budget — every field is
    /// plain ASCII, so truncating at a byte boundary never splits a UTF-8
    /// character.
    pub fn op_return_commitment(&self) -> Vec<u8> {
        let envelope = serde_json::json!({
            "pohw": 1,
            "root": self.root.to_hex(),
            "batch": self.batch_id,
            "registry": self.registry_id,
            "timestamp": self.anchored_at,
        });
        let mut bytes = serde_json::to_vec(&envelope).expect("JSON envelope of plain scalars never fails to serialize");
        bytes.truncate(pohw_core::constants::BITCOIN_OP_RETURN_MAX_BYTES);
        bytes
    }

    /// Ethereum commits to the full canonical payload via `keccak256`
    /// (§4.9), since a transaction's `data` field has no meaningful size
    /// budget the way an `OP_RETURN` output does.
    pub fn keccak_commitment(&self) -> [u8; 32] {
        use sha3::{Digest, Keccak256};
        let digest = Keccak256::digest(self.canonical_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}

/// `AnchorResult = (chain, txHash?, blockNumber?, ok, error?)` (§4.9).
#[derive(Clone, Debug)]
pub struct AnchorResult {
    pub chain: pohw_core::ChainKind,
    pub tx_hash: Option<String>,
    pub block_number: Option<u64>,
    pub ok: bool,
    pub error: Option<String>,
}
