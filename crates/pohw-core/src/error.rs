use thiserror::Error;

/// The registry-wide error taxonomy (§7). Kinds, not names — every component
/// surfaces one of these, each carrying the structured fields its kind needs.
#[derive(Error, Debug)]
pub enum PohwError {
    // ── Validation ───────────────────────────────────────────────────────────
    #[error("validation failed: {0}")]
    Validation(String),

    // ── Conflict ─────────────────────────────────────────────────────────────
    #[error("conflict: {reason} (existing id: {existing_id})")]
    Conflict { reason: String, existing_id: String },

    // ── Auth ─────────────────────────────────────────────────────────────────
    #[error("signature verification failed")]
    InvalidSignature,

    #[error("attestor {0} is not active")]
    AttestorNotActive(String),

    #[error("rotation signed by wrong key for identifier {0}")]
    WrongRotationKey(String),

    // ── Rate limit ───────────────────────────────────────────────────────────
    #[error("rate limit exceeded: {observed}/{limit} submissions in the window")]
    RateLimit { limit: u32, observed: u32 },

    // ── Not found ────────────────────────────────────────────────────────────
    #[error("proof not found: {0}")]
    ProofNotFound(String),

    #[error("batch not found: {0}")]
    BatchNotFound(String),

    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),

    #[error("challenge not found: {0}")]
    ChallengeNotFound(String),

    #[error("attestor not found: {0}")]
    AttestorNotFound(String),

    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    // ── Transient (network / RPC) ───────────────────────────────────────────
    #[error("transient error calling {endpoint}: {detail}")]
    Transient { endpoint: String, detail: String },

    // ── Anchor ───────────────────────────────────────────────────────────────
    #[error("anchor failed on {chain}: {detail}{}", .funding_hint.as_ref().map(|h| format!(" ({h})")).unwrap_or_default())]
    Anchor {
        chain: String,
        detail: String,
        funding_hint: Option<String>,
        retryable: bool,
    },

    // ── Integrity ────────────────────────────────────────────────────────────
    #[error("merkle root mismatch: expected {expected}, got {got}")]
    MerkleMismatch { expected: String, got: String },

    #[error("continuity chain cycle detected at {0}")]
    ContinuityCycle(String),

    #[error("store inconsistency: {0}")]
    StoreInconsistency(String),

    // ── Backpressure (§5) ────────────────────────────────────────────────────
    #[error("backpressure: pending queue has {pending} entries, max is {max}")]
    Backpressure { pending: u64, max: u64 },

    // ── Store-layer plumbing ────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl PohwError {
    /// A short machine-readable reason code, distinct from the human-readable
    /// `Display` text (§7 "errors are always returned with a short
    /// machine-readable reason and a human-readable detail").
    pub fn reason_code(&self) -> &'static str {
        match self {
            PohwError::Validation(_) => "validation_error",
            PohwError::Conflict { .. } => "conflict_error",
            PohwError::InvalidSignature
            | PohwError::AttestorNotActive(_)
            | PohwError::WrongRotationKey(_) => "auth_error",
            PohwError::RateLimit { .. } => "rate_limit_error",
            PohwError::ProofNotFound(_)
            | PohwError::BatchNotFound(_)
            | PohwError::IdentifierNotFound(_)
            | PohwError::ChallengeNotFound(_)
            | PohwError::AttestorNotFound(_)
            | PohwError::CredentialNotFound(_) => "not_found_error",
            PohwError::Transient { .. } => "transient_error",
            PohwError::Anchor { .. } => "anchor_error",
            PohwError::MerkleMismatch { .. }
            | PohwError::ContinuityCycle(_)
            | PohwError::StoreInconsistency(_) => "integrity_error",
            PohwError::Backpressure { .. } => "backpressure_error",
            PohwError::Storage(_) | PohwError::Serialization(_) => "storage_error",
            PohwError::Other(_) => "other_error",
        }
    }

    /// Whether a caller may retry this error automatically. Only `Transient`
    /// and retryable `Anchor` errors qualify (§7 propagation rule).
    pub fn is_retryable(&self) -> bool {
        matches!(self, PohwError::Transient { .. })
            || matches!(self, PohwError::Anchor { retryable: true, .. })
    }
}
