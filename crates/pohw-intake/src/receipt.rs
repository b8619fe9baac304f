//! The intake receipt (§4.7, §6): `{ receiptHash, timestamp, registry }`.

use pohw_core::{ContentHash, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub receipt_hash: ContentHash,
    pub timestamp: Timestamp,
    pub registry_id: String,
}
