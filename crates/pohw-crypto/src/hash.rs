use pohw_core::{ContentHash, Identifier, Timestamp};

pub use pohw_core::hash;

/// Stable byte serialization of the subset of a `ProofRecord` that is signed:
/// `(contentHash, authorId, authorTimestamp)` (§4.1).
///
/// Deliberately not `bincode` — the canonical form must be identical across
/// implementations in other languages, so it is hand-assembled: the raw
/// digest bytes, then the identifier's UTF-8 bytes length-prefixed, then the
/// timestamp as big-endian i64.
pub fn canonicalize(content_hash: &ContentHash, author_id: &Identifier, author_timestamp: Timestamp) -> Vec<u8> {
    let id_bytes = author_id.as_str().as_bytes();
    let mut out = Vec::with_capacity(32 + 4 + id_bytes.len() + 8);
    out.extend_from_slice(content_hash.as_bytes());
    out.extend_from_slice(&(id_bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(id_bytes);
    out.extend_from_slice(&author_timestamp.to_be_bytes());
    out
}

/// `H(contentHash || processDigest)` (§3).
pub fn compound_hash(content_hash: &ContentHash, process_digest: &ContentHash) -> ContentHash {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(content_hash.as_bytes());
    buf.extend_from_slice(process_digest.as_bytes());
    hash(&buf)
}

/// Receipt hash returned by intake: `H(contentHash || authorId || authorTimestamp)` (§4.7).
pub fn receipt_hash(content_hash: &ContentHash, author_id: &Identifier, author_timestamp: Timestamp) -> ContentHash {
    hash(&canonicalize(content_hash, author_id, author_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_is_deterministic() {
        let ch = ContentHash::from_bytes([1u8; 32]);
        let id = Identifier::parse("did:pohw:alice").unwrap();
        let a = canonicalize(&ch, &id, 1_700_000_000);
        let b = canonicalize(&ch, &id, 1_700_000_000);
        assert_eq!(a, b);
    }

    #[test]
    fn compound_hash_differs_from_content_hash() {
        let ch = ContentHash::from_bytes([1u8; 32]);
        let pd = ContentHash::from_bytes([2u8; 32]);
        assert_ne!(compound_hash(&ch, &pd), ch);
    }
}
