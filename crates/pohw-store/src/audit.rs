//! Attestor audit log, reputation, and the fraud-mitigation submission /
//! anomaly histories (§4.3, §4.5, §4.6). Three retention caps apply here,
//! all pulled from `pohw_core::constants` rather than hard-coded:
//! the audit log keeps the most recent `AUDIT_LOG_RETENTION` entries,
//! per-identity anomalies keep `ANOMALY_LIST_RETENTION`, and per-identity
//! submissions are pruned to the last `SUBMISSION_HISTORY_RETENTION_SECS`.

use pohw_core::{
    constants::{ANOMALY_LIST_RETENTION, AUDIT_LOG_RETENTION, SUBMISSION_HISTORY_RETENTION_SECS},
    AnomalyRecord, AuditEntry, Identifier, PohwError, Reputation, SubmissionRecord, Timestamp,
};

use crate::db::{de, ser, RegistryStore};
use crate::traits::AuditStore;

fn identity_prefix(identifier: &Identifier) -> Vec<u8> {
    let mut key = identifier.as_str().as_bytes().to_vec();
    key.push(0u8);
    key
}

impl AuditStore for RegistryStore {
    fn append_audit(&self, entry: AuditEntry) -> Result<(), PohwError> {
        let seq = self.next_seq("audit")?;
        self.audit
            .insert(seq.to_be_bytes(), ser(&entry)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;

        while self.audit.len() > AUDIT_LOG_RETENTION {
            if let Some((key, _)) = self.audit.iter().next().transpose().map_err(|e| PohwError::Storage(e.to_string()))? {
                self.audit.remove(key).map_err(|e| PohwError::Storage(e.to_string()))?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn list_audit(&self, attestor_id: Option<&Identifier>, limit: usize) -> Result<Vec<AuditEntry>, PohwError> {
        let mut out = Vec::new();
        for item in self.audit.iter().rev() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            let entry: AuditEntry = de(&bytes)?;
            if attestor_id.map_or(true, |id| id == &entry.attestor_id) {
                out.push(entry);
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    fn put_reputation(&self, reputation: Reputation) -> Result<(), PohwError> {
        self.reputation
            .insert(reputation.identifier.as_str().as_bytes(), ser(&reputation)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_reputation(&self, identifier: &Identifier) -> Result<Option<Reputation>, PohwError> {
        match self
            .reputation
            .get(identifier.as_str().as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_reputation(&self) -> Result<Vec<Reputation>, PohwError> {
        let mut out = Vec::new();
        for item in self.reputation.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }

    fn append_submission(&self, record: SubmissionRecord) -> Result<(), PohwError> {
        let mut key = identity_prefix(&record.identifier);
        key.extend_from_slice(&record.at.to_be_bytes());
        self.submissions.insert(key, ser(&record)?).map_err(|e| PohwError::Storage(e.to_string()))?;

        let cutoff = record.at - SUBMISSION_HISTORY_RETENTION_SECS;
        let prefix = identity_prefix(&record.identifier);
        let mut stale = Vec::new();
        for item in self.submissions.scan_prefix(&prefix) {
            let (key, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            let existing: SubmissionRecord = de(&bytes)?;
            if existing.at < cutoff {
                stale.push(key);
            }
        }
        for key in stale {
            self.submissions.remove(key).map_err(|e| PohwError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    fn list_submissions_since(&self, identifier: &Identifier, since: Timestamp) -> Result<Vec<SubmissionRecord>, PohwError> {
        let prefix = identity_prefix(identifier);
        let mut out = Vec::new();
        for item in self.submissions.scan_prefix(&prefix) {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            let record: SubmissionRecord = de(&bytes)?;
            if record.at >= since {
                out.push(record);
            }
        }
        out.sort_by_key(|r| r.at);
        Ok(out)
    }

    fn append_anomaly(&self, record: AnomalyRecord) -> Result<(), PohwError> {
        let seq = self.next_seq(&format!("anomaly:{}", record.identifier.as_str()))?;
        let mut key = identity_prefix(&record.identifier);
        key.extend_from_slice(&seq.to_be_bytes());
        self.anomalies.insert(key, ser(&record)?).map_err(|e| PohwError::Storage(e.to_string()))?;

        let prefix = identity_prefix(&record.identifier);
        let mut keys: Vec<_> = self
            .anomalies
            .scan_prefix(&prefix)
            .map(|item| item.map(|(k, _)| k).map_err(|e| PohwError::Storage(e.to_string())))
            .collect::<Result<_, _>>()?;
        if keys.len() > ANOMALY_LIST_RETENTION {
            keys.sort();
            let excess = keys.len() - ANOMALY_LIST_RETENTION;
            for key in &keys[..excess] {
                self.anomalies.remove(key).map_err(|e| PohwError::Storage(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn list_anomalies(&self, identifier: &Identifier) -> Result<Vec<AnomalyRecord>, PohwError> {
        let prefix = identity_prefix(identifier);
        let mut out = Vec::new();
        for item in self.anomalies.scan_prefix(&prefix) {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }
}
