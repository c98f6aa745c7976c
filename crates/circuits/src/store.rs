//! Native backing store for hash paths.

use std::collections::HashMap;
use std::sync::Arc;

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use num_traits::Zero;
use tree_hash::TreeHasher;

use crate::config::validate_depth;
use crate::error::TreeError;
use crate::hash_path::HashPath;
use crate::index::{check_index, Side};

/// Value of every leaf that has never been written.
pub const EMPTY_LEAF: [u8; 64] = [0u8; 64];

/// Key-addressed store of hash paths, keyed by leaf index.
///
/// Not circuit aware. Single owner; callers serialise access.
pub trait HashPathStore<F: PrimeField> {
    fn depth(&self) -> usize;

    fn root(&self) -> F;

    /// Sibling pairs along the path of `index`, leaf level first.
    fn get_hash_path(&self, index: &BigUint) -> Result<HashPath<F>, TreeError>;

    /// Replace the leaf at `index` with `value` and rehash up to the root.
    fn update_element(&mut self, index: &BigUint, value: &[u8]) -> Result<(), TreeError>;
}

/// Sparse in-memory tree. Nodes that were never written hold the zero hash
/// of their level.
#[derive(Clone, Debug)]
pub struct MemoryStore<F: PrimeField> {
    depth: usize,
    hasher: Arc<TreeHasher<F>>,
    /// `zero_hashes[level]` is the value of an untouched node at `level`.
    zero_hashes: Vec<F>,
    /// `nodes[level]` maps a position within the level to its value.
    nodes: Vec<HashMap<BigUint, F>>,
}

impl<F: PrimeField + Absorb> MemoryStore<F> {
    pub fn new(depth: usize, hasher: Arc<TreeHasher<F>>) -> Result<Self, TreeError> {
        validate_depth(depth)?;

        let mut zero_hashes = Vec::with_capacity(depth + 1);
        let mut current = hasher.hash_leaf(&EMPTY_LEAF);
        zero_hashes.push(current);
        for _ in 0..depth {
            current = hasher.compress(current, current);
            zero_hashes.push(current);
        }

        Ok(Self {
            depth,
            hasher,
            zero_hashes,
            nodes: vec![HashMap::new(); depth + 1],
        })
    }

    pub fn hasher(&self) -> &Arc<TreeHasher<F>> {
        &self.hasher
    }

    /// Value of an untouched node at `level`.
    pub fn zero_hash(&self, level: usize) -> F {
        self.zero_hashes[level]
    }

    /// Leaf hash stored at `index`.
    pub fn get_element(&self, index: &BigUint) -> Result<F, TreeError> {
        check_index(index, self.depth)?;
        Ok(self.node(0, index))
    }

    /// Number of nodes that differ from the default tree.
    pub fn num_written_nodes(&self) -> usize {
        self.nodes.iter().map(HashMap::len).sum()
    }

    fn node(&self, level: usize, position: &BigUint) -> F {
        self.nodes[level]
            .get(position)
            .copied()
            .unwrap_or(self.zero_hashes[level])
    }
}

impl<F: PrimeField + Absorb> HashPathStore<F> for MemoryStore<F> {
    fn depth(&self) -> usize {
        self.depth
    }

    fn root(&self) -> F {
        self.node(self.depth, &BigUint::zero())
    }

    fn get_hash_path(&self, index: &BigUint) -> Result<HashPath<F>, TreeError> {
        check_index(index, self.depth)?;

        let mut levels = Vec::with_capacity(self.depth);
        for level in 0..self.depth {
            let left = (index >> (level + 1)) << 1usize;
            let right = &left + 1u32;
            levels.push((self.node(level, &left), self.node(level, &right)));
        }
        HashPath::new(levels)
    }

    fn update_element(&mut self, index: &BigUint, value: &[u8]) -> Result<(), TreeError> {
        check_index(index, self.depth)?;

        let mut current = self.hasher.hash_leaf(value);
        let mut position = index.clone();
        self.nodes[0].insert(position.clone(), current);

        for level in 0..self.depth {
            current = match Side::of(index, level) {
                Side::Left => {
                    let sibling = self.node(level, &(&position + 1u32));
                    self.hasher.compress(current, sibling)
                }
                Side::Right => {
                    let sibling = self.node(level, &(&position - 1u32));
                    self.hasher.compress(sibling, current)
                }
            };
            position >>= 1usize;
            self.nodes[level + 1].insert(position.clone(), current);
        }
        Ok(())
    }
}
