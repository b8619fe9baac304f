//! Entropy-discrepancy anomaly check (§4.6).

use pohw_core::{constants::DEFAULT_ENTROPY_TOLERANCE, Identifier, PohwError};
use pohw_store::{AuditStore, RegistryStore};

/// Compare `current_entropy` against the identifier's historical average
/// (submissions carrying an entropy value, over the full retained history —
/// already bounded by the store's own 24h retention on `submissions`).
/// Returns `Some(detail)` when the relative discrepancy exceeds `tolerance`;
/// `None` when there's no baseline yet or the value is within tolerance.
pub fn check_entropy_discrepancy(
    store: &RegistryStore,
    identifier: &Identifier,
    current_entropy: f64,
    tolerance: f64,
) -> Result<Option<String>, PohwError> {
    let history = store.list_submissions_since(identifier, i64::MIN)?;
    let samples: Vec<f64> = history.iter().filter_map(|s| s.entropy).collect();
    if samples.is_empty() {
        return Ok(None);
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    if mean <= 0.0 {
        return Ok(None);
    }
    let relative_discrepancy = (current_entropy - mean).abs() / mean;
    if relative_discrepancy > tolerance {
        Ok(Some(format!(
            "entropy {current_entropy:.4} deviates {relative_discrepancy:.2}x from historical mean {mean:.4}"
        )))
    } else {
        Ok(None)
    }
}

pub fn default_tolerance() -> f64 {
    DEFAULT_ENTROPY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use pohw_core::SubmissionRecord;
    use pohw_store::db::temp_store_for_tests as temp_store;

    #[test]
    fn no_baseline_means_no_anomaly() {
        let store = temp_store("fraud_entropy_no_baseline");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        assert!(check_entropy_discrepancy(&store, &id, 0.5, 0.25).unwrap().is_none());
    }

    #[test]
    fn within_tolerance_is_not_flagged() {
        let store = temp_store("fraud_entropy_within");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        for i in 0..5 {
            store.append_submission(SubmissionRecord { identifier: id.clone(), at: i, entropy: Some(0.5) }).unwrap();
        }
        assert!(check_entropy_discrepancy(&store, &id, 0.55, 0.25).unwrap().is_none());
    }

    #[test]
    fn large_discrepancy_is_flagged() {
        let store = temp_store("fraud_entropy_flagged");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        for i in 0..5 {
            store.append_submission(SubmissionRecord { identifier: id.clone(), at: i, entropy: Some(0.5) }).unwrap();
        }
        let result = check_entropy_discrepancy(&store, &id, 2.0, 0.25).unwrap();
        assert!(result.is_some());
    }
}
