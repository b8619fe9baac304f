//! Per-identity sliding-window rate limiting (§4.6).

use pohw_core::{constants::DEFAULT_RATE_LIMIT_PER_HOUR, Identifier, PohwError, Timestamp};
use pohw_store::{AuditStore, RegistryStore};

const WINDOW_SECS: i64 = 3_600;

/// Check `identifier`'s submission history over the last hour against
/// `limit`. Does not record the current submission — callers append it via
/// `record_submission` only once the rest of intake has accepted it (§4.7:
/// "on violation... do not persist the submission").
pub fn check_rate_limit(store: &RegistryStore, identifier: &Identifier, now: Timestamp, limit: u32) -> Result<(), PohwError> {
    let recent = store.list_submissions_since(identifier, now - WINDOW_SECS)?;
    let observed = recent.len() as u32;
    if observed >= limit {
        return Err(PohwError::RateLimit { limit, observed });
    }
    Ok(())
}

pub fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;
    use pohw_core::SubmissionRecord;
    use pohw_store::db::temp_store_for_tests as temp_store;

    #[test]
    fn allows_submissions_under_the_limit() {
        let store = temp_store("fraud_rate_under");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        for i in 0..5 {
            store.append_submission(SubmissionRecord { identifier: id.clone(), at: i, entropy: None }).unwrap();
        }
        assert!(check_rate_limit(&store, &id, 10, 60).is_ok());
    }

    #[test]
    fn rejects_once_limit_is_reached() {
        let store = temp_store("fraud_rate_over");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        for i in 0..3 {
            store.append_submission(SubmissionRecord { identifier: id.clone(), at: i, entropy: None }).unwrap();
        }
        let err = check_rate_limit(&store, &id, 10, 3).unwrap_err();
        assert!(matches!(err, PohwError::RateLimit { limit: 3, observed: 3 }));
    }
}
