//! Reputation scoring and banding (§4.6). The banding thresholds come from
//! `pohw_core::constants`; the score deltas below are tuning defaults this
//! crate owns (the data contract only fixes direction, not magnitude).

use pohw_core::{
    constants::{REPUTATION_BLUE_FLOOR, REPUTATION_GREEN_FLOOR, REPUTATION_PURPLE_FLOOR},
    AnomalyRecord, Identifier, PohwError, Reputation, Tier, Timestamp,
};
use pohw_store::{AuditStore, RegistryStore};

const SUCCESS_BONUS: i16 = 1;
const ANOMALY_PENALTY: i16 = 5;
const CONFIRMED_FRAUD_PENALTY: i16 = 25;

/// Band a raw score onto the tier scale: `grey < 25 ≤ purple < 50 ≤ blue < 75 ≤ green` (§4.6).
pub fn band_for_score(score: u8) -> Tier {
    if score >= REPUTATION_GREEN_FLOOR {
        Tier::Green
    } else if score >= REPUTATION_BLUE_FLOOR {
        Tier::Blue
    } else if score >= REPUTATION_PURPLE_FLOOR {
        Tier::Purple
    } else {
        Tier::Grey
    }
}

fn adjust(store: &RegistryStore, identifier: &Identifier, now: Timestamp, delta: i16) -> Result<Reputation, PohwError> {
    let mut reputation = store.get_reputation(identifier)?.unwrap_or_else(|| Reputation::new(identifier.clone(), now));
    let new_score = (reputation.score as i16 + delta).clamp(0, 100) as u8;
    reputation.score = new_score;
    reputation.tier = band_for_score(new_score);
    reputation.last_updated = now;
    store.put_reputation(reputation.clone())?;
    Ok(reputation)
}

pub fn record_successful_proof(store: &RegistryStore, identifier: &Identifier, now: Timestamp) -> Result<Reputation, PohwError> {
    let mut reputation = adjust(store, identifier, now, SUCCESS_BONUS)?;
    reputation.successful_proofs += 1;
    store.put_reputation(reputation.clone())?;
    Ok(reputation)
}

pub fn record_anomaly(store: &RegistryStore, identifier: &Identifier, now: Timestamp, kind: &str, detail: &str) -> Result<Reputation, PohwError> {
    store.append_anomaly(AnomalyRecord { identifier: identifier.clone(), at: now, kind: kind.to_string(), detail: detail.to_string() })?;
    let mut reputation = adjust(store, identifier, now, -ANOMALY_PENALTY)?;
    reputation.anomalies += 1;
    store.put_reputation(reputation.clone())?;
    Ok(reputation)
}

/// Applied when a dispute resolves `confirmed` against the proof's author (§4.11).
pub fn record_confirmed_fraud(store: &RegistryStore, identifier: &Identifier, now: Timestamp) -> Result<Reputation, PohwError> {
    adjust(store, identifier, now, -CONFIRMED_FRAUD_PENALTY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pohw_store::db::temp_store_for_tests as temp_store;

    #[test]
    fn new_identifier_starts_blue() {
        assert_eq!(band_for_score(100), Tier::Green);
        assert_eq!(band_for_score(80), Tier::Green);
        assert_eq!(band_for_score(60), Tier::Blue);
        assert_eq!(band_for_score(30), Tier::Purple);
        assert_eq!(band_for_score(10), Tier::Grey);
    }

    #[test]
    fn confirmed_fraud_drops_band() {
        let store = temp_store("fraud_reputation_confirmed");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        store.put_reputation(Reputation::new(id.clone(), 0)).unwrap();
        for _ in 0..3 {
            record_confirmed_fraud(&store, &id, 10).unwrap();
        }
        let reputation = store.get_reputation(&id).unwrap().unwrap();
        assert_eq!(reputation.score, 25);
        assert_eq!(reputation.tier, Tier::Purple);
    }

    #[test]
    fn score_never_exceeds_bounds() {
        let store = temp_store("fraud_reputation_bounds");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        for _ in 0..500 {
            record_successful_proof(&store, &id, 1).unwrap();
        }
        assert_eq!(store.get_reputation(&id).unwrap().unwrap().score, 100);
    }
}
