use pohw_core::{ContentHash, PohwError};

/// Hash an internal node from its two children under the "Bitcoin-style"
/// ordered-concat rule (§4.2): the lexicographically smaller hash goes
/// first. Building and verifying both use this rule, which is what makes a
/// duplicated node (`left == right`, the odd-level padding case) a no-op —
/// order doesn't matter when the two sides are equal.
fn pair_hash(left: &ContentHash, right: &ContentHash) -> ContentHash {
    if left.as_bytes() <= right.as_bytes() {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(left.as_bytes());
        buf.extend_from_slice(right.as_bytes());
        pohw_core::hash(&buf)
    } else {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(right.as_bytes());
        buf.extend_from_slice(left.as_bytes());
        pohw_core::hash(&buf)
    }
}

/// A built Merkle tree over an ordered set of leaves (§4.2). Holds every
/// level so inclusion proofs can be derived without recomputation; the
/// batcher is expected to discard this once the batch record is persisted
/// (the engine owns no persistent state, §3 "Ownership").
pub struct MerkleTree {
    /// `levels[0]` is the leaf row; `levels.last()` is `[root]`.
    levels: Vec<Vec<ContentHash>>,
}

impl MerkleTree {
    /// Build a tree over `leaves`, already-hashed 32-byte values in
    /// `merkleIndex` order (§4.2: "do not double-hash").
    ///
    /// Checks (in order):
    /// 1. Leaf list non-empty.
    pub fn build(leaves: &[ContentHash]) -> Result<Self, PohwError> {
        if leaves.is_empty() {
            return Err(PohwError::Validation("merkle tree requires at least one leaf".into()));
        }

        let mut levels = vec![leaves.to_vec()];
        while levels.last().unwrap().len() > 1 {
            let current = levels.last().unwrap();
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            let mut i = 0;
            while i < current.len() {
                let left = &current[i];
                let right = if i + 1 < current.len() { &current[i + 1] } else { left };
                next.push(pair_hash(left, right));
                i += 2;
            }
            levels.push(next);
        }

        Ok(Self { levels })
    }

    pub fn root(&self) -> ContentHash {
        self.levels.last().unwrap()[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Ordered sibling hashes from `index`'s leaf to the root (§4.2).
    /// A batch of size 1 has an empty proof.
    pub fn inclusion_proof(&self, index: usize) -> Result<Vec<ContentHash>, PohwError> {
        if index >= self.levels[0].len() {
            return Err(PohwError::Validation(format!(
                "leaf index {index} not found (tree has {} leaves)",
                self.levels[0].len()
            )));
        }

        let mut proof = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            let sibling = if sibling_idx < level.len() { level[sibling_idx] } else { level[idx] };
            proof.push(sibling);
            idx /= 2;
        }
        Ok(proof)
    }
}

/// Recompute the root from `leaf` and its sibling path, and compare against
/// `expected_root` (§4.2 inclusion-proof verification).
pub fn verify_proof(leaf: ContentHash, proof: &[ContentHash], expected_root: ContentHash) -> bool {
    let mut current = leaf;
    for sibling in proof {
        current = pair_hash(&current, sibling);
    }
    current == expected_root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> ContentHash {
        ContentHash::from_bytes([byte; 32])
    }

    #[test]
    fn empty_leaves_rejected() {
        assert!(MerkleTree::build(&[]).is_err());
    }

    #[test]
    fn single_leaf_root_equals_leaf() {
        let l = leaf(0xAA);
        let tree = MerkleTree::build(&[l]).unwrap();
        assert_eq!(tree.root(), l);
        let proof = tree.inclusion_proof(0).unwrap();
        assert!(proof.is_empty());
        assert!(verify_proof(l, &proof, tree.root()));
    }

    #[test]
    fn four_leaves_every_proof_verifies() {
        let leaves = vec![leaf(0x01), leaf(0x02), leaf(0x03), leaf(0x04)];
        let tree = MerkleTree::build(&leaves).unwrap();
        for (i, l) in leaves.iter().enumerate() {
            let proof = tree.inclusion_proof(i).unwrap();
            assert!(verify_proof(*l, &proof, tree.root()), "leaf {i} failed to verify");
        }
    }

    #[test]
    fn odd_count_duplicates_last_leaf() {
        let leaves = vec![leaf(0x01), leaf(0x02), leaf(0x03)];
        let tree = MerkleTree::build(&leaves).unwrap();
        for (i, l) in leaves.iter().enumerate() {
            let proof = tree.inclusion_proof(i).unwrap();
            assert!(verify_proof(*l, &proof, tree.root()));
        }
    }

    #[test]
    fn tampered_leaf_fails_verification() {
        let leaves = vec![leaf(0x01), leaf(0x02), leaf(0x03), leaf(0x04)];
        let tree = MerkleTree::build(&leaves).unwrap();
        let proof = tree.inclusion_proof(1).unwrap();
        assert!(!verify_proof(leaf(0xFF), &proof, tree.root()));
    }

    #[test]
    fn out_of_range_index_errors() {
        let leaves = vec![leaf(0x01), leaf(0x02)];
        let tree = MerkleTree::build(&leaves).unwrap();
        assert!(tree.inclusion_proof(5).is_err());
    }

    #[test]
    fn determinism_same_leaves_same_root() {
        let leaves = vec![leaf(0x01), leaf(0x02), leaf(0x03), leaf(0x04), leaf(0x05)];
        let t1 = MerkleTree::build(&leaves).unwrap();
        let t2 = MerkleTree::build(&leaves).unwrap();
        assert_eq!(t1.root(), t2.root());
    }
}
