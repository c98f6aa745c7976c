//! Hash functions for Merkle tree commitments.
//!
//! The tree uses two different hash functions on purpose:
//! - a wide Poseidon sponge (rate 4) for leaf values, which are byte strings
//!   of any length
//! - a narrow Poseidon sponge (rate 2) as the two-to-one compression for
//!   internal nodes
//!
//! Native and in-circuit versions must agree exactly. The gadgets live in
//! [`constraints`].

pub mod constraints;
pub mod params;

pub use params::{leaf_config, node_config};

use ark_crypto_primitives::sponge::{
    poseidon::{PoseidonConfig, PoseidonSponge},
    Absorb, CryptographicSponge,
};
use ark_ff::PrimeField;

/// Number of bytes packed into one field element of a leaf pre-image.
pub fn leaf_chunk_size<F: PrimeField>() -> usize {
    ((F::MODULUS_BIT_SIZE - 1) / 8) as usize
}

/// Pack a leaf value into sponge input: its byte length, then the bytes in
/// little-endian chunks of [`leaf_chunk_size`] bytes.
pub fn pack_bytes<F: PrimeField>(value: &[u8]) -> Vec<F> {
    let chunk_size = leaf_chunk_size::<F>();
    let mut elements = Vec::with_capacity(1 + value.len().div_ceil(chunk_size));
    elements.push(F::from(value.len() as u64));
    elements.extend(value.chunks(chunk_size).map(F::from_le_bytes_mod_order));
    elements
}

/// The leaf hash and node compression function used by a tree.
#[derive(Clone, Debug)]
pub struct TreeHasher<F: PrimeField> {
    leaf: PoseidonConfig<F>,
    node: PoseidonConfig<F>,
}

impl<F: PrimeField + Absorb> TreeHasher<F> {
    /// Generate both parameter sets. This runs the Grain LFSR, so share the
    /// result instead of calling it per operation.
    pub fn new() -> Self {
        Self {
            leaf: leaf_config(),
            node: node_config(),
        }
    }

    pub fn leaf_config(&self) -> &PoseidonConfig<F> {
        &self.leaf
    }

    pub fn node_config(&self) -> &PoseidonConfig<F> {
        &self.node
    }

    /// Hash a raw leaf value.
    pub fn hash_leaf(&self, value: &[u8]) -> F {
        poseidon_hash(&self.leaf, &pack_bytes(value))
    }

    /// Compress two children into their parent.
    pub fn compress(&self, left: F, right: F) -> F {
        poseidon_hash(&self.node, &[left, right])
    }
}

impl<F: PrimeField + Absorb> Default for TreeHasher<F> {
    fn default() -> Self {
        Self::new()
    }
}

fn poseidon_hash<F: PrimeField + Absorb>(config: &PoseidonConfig<F>, inputs: &[F]) -> F {
    let mut sponge = PoseidonSponge::<F>::new(config);
    sponge.absorb(&inputs);
    sponge.squeeze_field_elements(1)[0]
}
