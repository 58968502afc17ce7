//! Merkle Authorization Checker
//!
//! Pure functions over SHA-256. A leaf commits to (owner, amount, nonce) and
//! deliberately leaves the chain id out. Inner nodes hash their two children
//! in sorted order, so a proof is just the ordered list of siblings from the
//! leaf up; no left/right flags are needed.
//!
//! `MerkleTree` builds roots and proofs from a leaf set; the operator uses it
//! to publish the authorized-withdrawal set, and tests use it to hand-build
//! trees.

use bridge_types::ids::{AccountId, Digest};
use bridge_types::numeric::{canonical_amount_bytes, Amount};
use sha2::{Digest as _, Sha256};

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Leaf committing to one authorized withdrawal.
pub fn leaf_hash(owner: &AccountId, amount: Amount, nonce: u64) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(owner.as_bytes());
    hasher.update(canonical_amount_bytes(amount));
    hasher.update(nonce.to_be_bytes());
    Digest::from_bytes(hasher.finalize().into())
}

/// Commutative parent hash of two siblings.
pub fn hash_pair(a: &Digest, b: &Digest) -> Digest {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(lo.as_bytes());
    hasher.update(hi.as_bytes());
    Digest::from_bytes(hasher.finalize().into())
}

/// Fold `proof` into `leaf`, returning the implied root.
pub fn process_proof(proof: &[Digest], leaf: &Digest) -> Digest {
    proof
        .iter()
        .fold(*leaf, |node, sibling| hash_pair(&node, sibling))
}

/// Whether `proof` links `leaf` to `root`.
pub fn verify(proof: &[Digest], root: &Digest, leaf: &Digest) -> bool {
    process_proof(proof, leaf) == *root
}

/// Fully materialized tree: `layers[0]` are the leaves, the last layer is
/// the root. A node without a sibling is promoted unchanged.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<Digest>>,
}

impl MerkleTree {
    pub fn from_leaves(leaves: Vec<Digest>) -> Self {
        if leaves.is_empty() {
            return Self { layers: vec![] };
        }

        let mut layers = vec![leaves];
        while layers[layers.len() - 1].len() > 1 {
            let next = layers[layers.len() - 1]
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            layers.push(next);
        }
        Self { layers }
    }

    /// Root of the tree; `Digest::ZERO` for an empty tree.
    pub fn root(&self) -> Digest {
        self.layers
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(Digest::ZERO)
    }

    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Sibling path for the leaf at `index`, or `None` if out of range.
    pub fn proof(&self, index: usize) -> Option<Vec<Digest>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut path = Vec::new();
        let mut position = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = position ^ 1;
            if let Some(node) = layer.get(sibling) {
                path.push(*node);
            }
            position /= 2;
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn leaves(n: u64) -> (AccountId, Vec<Digest>) {
        let owner = AccountId::new();
        let leaves = (0..n)
            .map(|nonce| leaf_hash(&owner, Decimal::ONE, nonce))
            .collect();
        (owner, leaves)
    }

    #[test]
    fn test_leaf_hash_binds_owner_amount_nonce() {
        let owner = AccountId::new();
        let base = leaf_hash(&owner, Decimal::ONE, 0);
        assert_eq!(base, leaf_hash(&owner, Decimal::new(10, 1), 0));
        assert_ne!(base, leaf_hash(&owner, Decimal::ONE, 1));
        assert_ne!(base, leaf_hash(&owner, Decimal::from(2), 0));
        assert_ne!(base, leaf_hash(&AccountId::new(), Decimal::ONE, 0));
    }

    #[test]
    fn test_hash_pair_commutative() {
        let a = Digest::from_bytes([1u8; 32]);
        let b = Digest::from_bytes([2u8; 32]);
        assert_eq!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn test_single_leaf_tree() {
        let (_, leaves) = leaves(1);
        let tree = MerkleTree::from_leaves(leaves.clone());
        assert_eq!(tree.root(), leaves[0]);
        let proof = tree.proof(0).unwrap();
        assert!(proof.is_empty());
        assert!(verify(&proof, &tree.root(), &leaves[0]));
    }

    #[test]
    fn test_hand_built_two_leaf_tree() {
        let (_, leaves) = leaves(2);
        let root = hash_pair(&leaves[0], &leaves[1]);
        assert!(verify(&[leaves[1]], &root, &leaves[0]));
        assert!(verify(&[leaves[0]], &root, &leaves[1]));
    }

    #[test]
    fn test_every_leaf_verifies_odd_tree() {
        let (_, leaves) = leaves(7);
        let tree = MerkleTree::from_leaves(leaves.clone());
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert!(verify(&proof, &tree.root(), leaf), "leaf {} failed", i);
        }
    }

    #[test]
    fn test_wrong_leaf_rejected() {
        let (owner, leaves) = leaves(4);
        let tree = MerkleTree::from_leaves(leaves);
        let proof = tree.proof(0).unwrap();
        let forged = leaf_hash(&owner, Decimal::from(100), 0);
        assert!(!verify(&proof, &tree.root(), &forged));
    }

    #[test]
    fn test_tampered_proof_rejected() {
        let (_, leaves) = leaves(4);
        let tree = MerkleTree::from_leaves(leaves.clone());
        let mut proof = tree.proof(2).unwrap();
        proof[0] = Digest::from_bytes([0xff; 32]);
        assert!(!verify(&proof, &tree.root(), &leaves[2]));
    }

    #[test]
    fn test_proof_out_of_range() {
        let (_, leaves) = leaves(3);
        let tree = MerkleTree::from_leaves(leaves);
        assert!(tree.proof(3).is_none());
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::from_leaves(vec![]);
        assert_eq!(tree.root(), Digest::ZERO);
        assert_eq!(tree.leaf_count(), 0);
        assert!(tree.proof(0).is_none());
    }
}
