//! Tunable defaults (§6 "Environment / configuration").

/// Batch drain threshold (§4.8, §6).
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Peer sync period in milliseconds (§4.10, §6).
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 3_600_000;

/// Snapshot publication period in milliseconds (§6).
pub const DEFAULT_SNAPSHOT_INTERVAL_MS: u64 = 86_400_000;

/// Backpressure ceiling on the pending-proof queue (§5).
pub const DEFAULT_MAX_PENDING: usize = 50_000;

/// Per-identity submissions allowed per sliding hour before a rate-limit
/// rejection (§4.6).
pub const DEFAULT_RATE_LIMIT_PER_HOUR: u32 = 60;

/// Audit log retention cap, most-recent-N (§4.3).
pub const AUDIT_LOG_RETENTION: usize = 10_000;

/// Per-identity anomaly list retention cap (§4.3).
pub const ANOMALY_LIST_RETENTION: usize = 100;

/// Submission history retention window, in seconds (§4.3: "last 24 hours").
pub const SUBMISSION_HISTORY_RETENTION_SECS: i64 = 24 * 3_600;

/// Reputation score banding (§4.6): `grey < 25 <= purple < 50 <= blue < 75 <= green`.
pub const REPUTATION_PURPLE_FLOOR: u8 = 25;
pub const REPUTATION_BLUE_FLOOR: u8 = 50;
pub const REPUTATION_GREEN_FLOOR: u8 = 75;

/// Entropy-discrepancy tolerance used by the anomaly check (§4.6).
pub const DEFAULT_ENTROPY_TOLERANCE: f64 = 0.25;

/// Bitcoin OP_RETURN payload byte budget (§4.9, §6).
pub const BITCOIN_OP_RETURN_MAX_BYTES: usize = 80;

/// Bitcoin dust limit in satoshis (§4.9).
pub const BITCOIN_DUST_LIMIT_SATS: u64 = 546;

/// Minimum UTXO-selection fee buffer in satoshis (§4.9).
pub const BITCOIN_FEE_BUFFER_SATS: u64 = 1000;

/// Fallback Bitcoin fee rates in sat/byte when `estimatesmartfee` is unavailable (§4.9).
pub const BITCOIN_FALLBACK_FEE_TESTNET: u64 = 10;
pub const BITCOIN_FALLBACK_FEE_MAINNET: u64 = 20;

/// Ethereum gas defaults (§4.9).
pub const ETHEREUM_MIN_GAS_LIMIT: u64 = 21_000;
pub const ETHEREUM_SAFE_DEFAULT_GAS_LIMIT: u64 = 50_000;
pub const ETHEREUM_GAS_ESTIMATE_MULTIPLIER: f64 = 1.2;

/// Anchor retry policy (§4.9): 3 attempts, exponential backoff.
pub const ANCHOR_RETRY_ATTEMPTS: u32 = 3;
pub const ANCHOR_READ_BACKOFF_INITIAL_MS: u64 = 1_000;
pub const ANCHOR_BROADCAST_BACKOFF_INITIAL_MS: u64 = 2_000;

/// Network call timeouts (§5).
pub const TIMEOUT_SMALL_GET_SECS: u64 = 10;
pub const TIMEOUT_SYNC_BULK_SECS: u64 = 30;
