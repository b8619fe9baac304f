//! Identity documents and the continuity (key-rotation) graph (§4.4).

use std::collections::HashSet;

use pohw_core::{ContinuityNode, Identifier, IdentityDocument, PohwError};

use crate::db::{de, ser, RegistryStore};
use crate::traits::IdentityStore;

impl IdentityStore for RegistryStore {
    fn put_document(&self, doc: IdentityDocument) -> Result<(), PohwError> {
        self.identity_documents
            .insert(doc.identifier.as_str().as_bytes(), ser(&doc)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_document(&self, identifier: &Identifier) -> Result<Option<IdentityDocument>, PohwError> {
        match self
            .identity_documents
            .get(identifier.as_str().as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_documents(&self) -> Result<Vec<IdentityDocument>, PohwError> {
        let mut out = Vec::new();
        for item in self.identity_documents.iter() {
            let (_, bytes) = item.map_err(|e| PohwError::Storage(e.to_string()))?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }

    fn put_continuity_node(&self, node: ContinuityNode) -> Result<(), PohwError> {
        self.continuity_nodes
            .insert(node.identifier.as_str().as_bytes(), ser(&node)?)
            .map_err(|e| PohwError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_continuity_node(&self, identifier: &Identifier) -> Result<Option<ContinuityNode>, PohwError> {
        match self
            .continuity_nodes
            .get(identifier.as_str().as_bytes())
            .map_err(|e| PohwError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Walk from `identifier` back through `previous_identifier` links to the
    /// root of its rotation history, newest first. A repeated identifier
    /// means the chain loops back on itself (§4.4 "reject a rotation that
    /// would introduce a cycle"), surfaced here rather than silently
    /// truncated since a caller walking the chain needs to know it's broken.
    fn walk_continuity_chain(&self, identifier: &Identifier) -> Result<Vec<ContinuityNode>, PohwError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(identifier.clone());

        while let Some(id) = current {
            if !seen.insert(id.as_str().to_string()) {
                return Err(PohwError::ContinuityCycle(id.as_str().to_string()));
            }
            let node = match self.get_continuity_node(&id)? {
                Some(n) => n,
                None => break,
            };
            current = node.previous_identifier.clone();
            chain.push(node);
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::temp_store;
    use pohw_core::{ContentHash, ContinuityStatus};

    fn node(id: &str, prev: Option<&str>, status: ContinuityStatus) -> ContinuityNode {
        ContinuityNode {
            identifier: Identifier::parse(id).unwrap(),
            key_fingerprint: ContentHash::from_bytes([0x01; 32]),
            previous_identifier: prev.map(|p| Identifier::parse(p).unwrap()),
            continuity_claim: None,
            created_at: 1,
            status,
        }
    }

    #[test]
    fn document_round_trip() {
        let store = temp_store("identity_doc");
        let id = Identifier::parse("did:pohw:alice").unwrap();
        let doc = IdentityDocument {
            identifier: id.clone(),
            verification_methods: vec![],
            created_at: 1,
            previous_identifier: None,
            continuity_claim: None,
        };
        store.put_document(doc).unwrap();
        assert!(store.get_document(&id).unwrap().is_some());
        assert_eq!(store.list_documents().unwrap().len(), 1);
    }

    #[test]
    fn walk_chain_follows_rotation_history() {
        let store = temp_store("identity_chain");
        store.put_continuity_node(node("did:pohw:v1", None, ContinuityStatus::Rotated)).unwrap();
        store
            .put_continuity_node(node("did:pohw:v2", Some("did:pohw:v1"), ContinuityStatus::Rotated))
            .unwrap();
        store
            .put_continuity_node(node("did:pohw:v3", Some("did:pohw:v2"), ContinuityStatus::Active))
            .unwrap();

        let chain = store.walk_continuity_chain(&Identifier::parse("did:pohw:v3").unwrap()).unwrap();
        let ids: Vec<_> = chain.iter().map(|n| n.identifier.as_str().to_string()).collect();
        assert_eq!(ids, vec!["did:pohw:v3", "did:pohw:v2", "did:pohw:v1"]);
    }

    #[test]
    fn walk_chain_detects_cycle() {
        let store = temp_store("identity_cycle");
        store
            .put_continuity_node(node("did:pohw:a", Some("did:pohw:b"), ContinuityStatus::Active))
            .unwrap();
        store
            .put_continuity_node(node("did:pohw:b", Some("did:pohw:a"), ContinuityStatus::Active))
            .unwrap();

        let err = store.walk_continuity_chain(&Identifier::parse("did:pohw:a").unwrap()).unwrap_err();
        assert!(matches!(err, PohwError::ContinuityCycle(_)));
    }
}
