//! The sled-backed store: one tree per entity kind, same shape as the
//! teacher's `StateDb` (open all trees up front, map every sled error
//! through `PohwError::Storage`).

use std::path::Path;

use pohw_core::PohwError;

/// Every registry-level entity multiplexed over a single sled database.
/// Holds no business logic; see `proofs.rs`, `batches.rs`, `identity.rs`,
/// `attestation.rs`, `audit.rs`, `disputes.rs` for the trait impls.
pub struct RegistryStore {
    pub(crate) _db: sled::Db,
    pub(crate) proofs: sled::Tree,
    pub(crate) proofs_by_compound: sled::Tree,
    pub(crate) batches: sled::Tree,
    pub(crate) batch_leaves: sled::Tree,
    pub(crate) identity_documents: sled::Tree,
    pub(crate) continuity_nodes: sled::Tree,
    pub(crate) attestors: sled::Tree,
    pub(crate) credentials: sled::Tree,
    pub(crate) credentials_by_subject: sled::Tree,
    pub(crate) revocations: sled::Tree,
    pub(crate) audit: sled::Tree,
    pub(crate) reputation: sled::Tree,
    pub(crate) submissions: sled::Tree,
    pub(crate) anomalies: sled::Tree,
    pub(crate) challenges: sled::Tree,
    pub(crate) transparency: sled::Tree,
    pub(crate) meta: sled::Tree,
}

fn storage_err(e: sled::Error) -> PohwError {
    PohwError::Storage(e.to_string())
}

impl RegistryStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PohwError> {
        let db = sled::open(path).map_err(storage_err)?;
        Ok(Self {
            proofs: db.open_tree("proofs").map_err(storage_err)?,
            proofs_by_compound: db.open_tree("proofs_by_compound").map_err(storage_err)?,
            batches: db.open_tree("batches").map_err(storage_err)?,
            batch_leaves: db.open_tree("batch_leaves").map_err(storage_err)?,
            identity_documents: db.open_tree("identity_documents").map_err(storage_err)?,
            continuity_nodes: db.open_tree("continuity_nodes").map_err(storage_err)?,
            attestors: db.open_tree("attestors").map_err(storage_err)?,
            credentials: db.open_tree("credentials").map_err(storage_err)?,
            credentials_by_subject: db.open_tree("credentials_by_subject").map_err(storage_err)?,
            revocations: db.open_tree("revocations").map_err(storage_err)?,
            audit: db.open_tree("audit").map_err(storage_err)?,
            reputation: db.open_tree("reputation").map_err(storage_err)?,
            submissions: db.open_tree("submissions").map_err(storage_err)?,
            anomalies: db.open_tree("anomalies").map_err(storage_err)?,
            challenges: db.open_tree("challenges").map_err(storage_err)?,
            transparency: db.open_tree("transparency").map_err(storage_err)?,
            meta: db.open_tree("meta").map_err(storage_err)?,
            _db: db,
        })
    }

    pub fn flush(&self) -> Result<(), PohwError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }

    pub(crate) fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), PohwError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }

    pub(crate) fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, PohwError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage_err)
    }

    /// Monotonic per-`counter` sequence, persisted in `meta` (same idiom as
    /// `next_schema_id`). Used to key append-only logs (audit, transparency,
    /// anomalies) so insertion order survives a restart.
    pub(crate) fn next_seq(&self, counter: &str) -> Result<u64, PohwError> {
        let key = format!("seq:{counter}");
        let current = self
            .get_meta(&key)?
            .map(|b| {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b[..8]);
                u64::from_be_bytes(arr)
            })
            .unwrap_or(0);
        self.put_meta(&key, &(current + 1).to_be_bytes())?;
        Ok(current)
    }
}

pub(crate) fn ser<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, PohwError> {
    bincode::serialize(value).map_err(|e| PohwError::Serialization(e.to_string()))
}

pub(crate) fn de<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, PohwError> {
    bincode::deserialize(bytes).map_err(|e| PohwError::Serialization(e.to_string()))
}

#[cfg(test)]
pub(crate) fn temp_store(name: &str) -> RegistryStore {
    temp_store_for_tests(name)
}

/// An isolated, throwaway `RegistryStore` under the system temp dir, keyed by
/// `name` so parallel test runs don't collide. Not behind `#[cfg(test)]`
/// because every downstream crate's own test suite needs a store to exercise
/// against pohw-store's traits, so this is exported rather than `pub(crate)`.
pub fn temp_store_for_tests(name: &str) -> RegistryStore {
    let dir = std::env::temp_dir().join(format!("pohw_store_test_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    RegistryStore::open(&dir).expect("open temp store")
}
