//! Attestors, credentials and revocations (§4.5). Credentials are indexed
//! by subject via a composite `subject || 0x00 || credentialHash` key,
//! scanned with `scan_prefix`.

use pohw_core::{AttestorRecord, ContentHash, Credential, Identifier, PohwError, RevocationEntry};

use crate::db::{de, ser, RegistryStore};
use crate::traits::AttestorStore;

fn subject_key(subject: &Identifier, credential_hash: &ContentHash) -> Vec<u8> {
    let mut key = subject.as_str().as_bytes().to_vec();
    key.push(0u8);
    key.extend_from_slice(credential_hash.as_bytes());
    key
}

impl AttestorStore for RegistryStore {
    fn put_attestor(&self, attestor: AttestorRecord) -> Result<(), PohwError> {
        self.attestors
            .insert(attestor.identifier.as_str().as_bytes(), ser(&attestor)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_attestor(&self, identifier: &Identifier) -> Result<Option<AttestorRecord>, PohwError> {
        match self
            .attestors
            .get(identifier.as_str().as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_attestors(&self) -> Result<Vec<AttestorRecord>, PohwError> {
        let mut out = Vec::new();
        for item in self.attestors.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }

    fn put_credential(&self, hash: ContentHash, credential: Credential) -> Result<(), PohwError> {
        self.credentials_by_subject
            .insert(subject_key(&credential.subject, &hash), &[])
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        self.credentials
            .insert(hash.as_bytes(), ser(&credential)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_credential(&self, hash: &ContentHash) -> Result<Option<Credential>, PohwError> {
        match self.credentials.get(hash.as_bytes()).map_err(|e| PohwError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_credentials_for_subject(&self, subject: &Identifier) -> Result<Vec<Credential>, PohwError> {
        let mut prefix = subject.as_str().as_bytes().to_vec();
        prefix.push(0u8);
        let mut out = Vec::new();
        for item in self.credentials_by_subject.scan_prefix(&prefix) {
            let (key, _) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            let hash_bytes = &key[prefix.len()..];
            let arr: [u8; 32] = hash_bytes
                .try_into()
                .map_err(|_| PohwError::StoreInconsistency("malformed credential index key".into()))?;
            if let Some(credential) = self.get_credential(&ContentHash::from_bytes(arr))? {
                out.push(credential);
            }
        }
        Ok(out)
    }

    fn put_revocation(&self, entry: RevocationEntry) -> Result<(), PohwError> {
        self.revocations
            .insert(entry.credential_hash.as_bytes(), ser(&entry)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_revocation(&self, credential_hash: &ContentHash) -> Result<Option<RevocationEntry>, PohwError> {
        match self
            .revocations
            .get(credential_hash.as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_revocations(&self) -> Result<Vec<RevocationEntry>, PohwError> {
        let mut out = Vec::new();
        for item in self.revocations.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }
}
