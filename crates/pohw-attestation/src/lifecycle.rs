//! Attestor lifecycle (§4.5): `pending → active → {suspended, revoked}`.
//! Every transition appends an immutable audit-log entry, mirroring how the
//! teacher's claims layer logs provider status changes.

use pohw_core::{AttestorRecord, AttestorStatus, AuditEntry, Identifier, PohwError, Timestamp};
use pohw_store::{AttestorStore, AuditStore, RegistryStore};

fn log(store: &RegistryStore, attestor_id: &Identifier, at: Timestamp, kind: &str, detail: String) -> Result<(), PohwError> {
    store.append_audit(AuditEntry { attestor_id: attestor_id.clone(), at, kind: kind.to_string(), detail })
}

/// Register a new attestor in `pending` status regardless of what status the
/// caller set on the record — registration is always the entry point.
pub fn register_attestor(store: &RegistryStore, mut record: AttestorRecord, now: Timestamp) -> Result<AttestorRecord, PohwError> {
    if store.get_attestor(&record.identifier)?.is_some() {
        return Err(PohwError::Conflict {
            reason: "attestor is already registered".into(),
            existing_id: record.identifier.as_str().to_string(),
        });
    }
    record.status = AttestorStatus::Pending;
    record.registered_at = now;
    store.put_attestor(record.clone())?;
    log(store, &record.identifier, now, "registered", format!("{:?}", record.attestor_type))?;
    Ok(record)
}

fn transition(
    store: &RegistryStore,
    identifier: &Identifier,
    expected: &[AttestorStatus],
    next: AttestorStatus,
    now: Timestamp,
    kind: &str,
) -> Result<AttestorRecord, PohwError> {
    let mut record = store
        .get_attestor(identifier)?
        .ok_or_else(|| PohwError::AttestorNotFound(identifier.as_str().to_string()))?;
    if !expected.contains(&record.status) {
        return Err(PohwError::Conflict {
            reason: format!("attestor status {:?} cannot transition to {:?}", record.status, next),
            existing_id: identifier.as_str().to_string(),
        });
    }
    record.status = next;
    store.put_attestor(record.clone())?;
    log(store, identifier, now, kind, String::new())?;
    Ok(record)
}

pub fn approve_attestor(store: &RegistryStore, identifier: &Identifier, now: Timestamp) -> Result<AttestorRecord, PohwError> {
    transition(store, identifier, &[AttestorStatus::Pending], AttestorStatus::Active, now, "approved")
}

pub fn suspend_attestor(store: &RegistryStore, identifier: &Identifier, now: Timestamp) -> Result<AttestorRecord, PohwError> {
    transition(store, identifier, &[AttestorStatus::Active], AttestorStatus::Suspended, now, "suspended")
}

pub fn revoke_attestor(store: &RegistryStore, identifier: &Identifier, now: Timestamp) -> Result<AttestorRecord, PohwError> {
    transition(
        store,
        identifier,
        &[AttestorStatus::Active, AttestorStatus::Suspended],
        AttestorStatus::Revoked,
        now,
        "revoked",
    )
}
