//! R1CS gadgets for the tree hash functions.

use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar,
    poseidon::{constraints::PoseidonSpongeVar, PoseidonConfig},
    Absorb,
};
use ark_ff::PrimeField;
use ark_r1cs_std::{
    fields::{fp::FpVar, FieldVar},
    prelude::*,
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::{leaf_chunk_size, TreeHasher};

/// In-circuit counterpart of [`crate::pack_bytes`]. The length prefix is a
/// constant, so the circuit shape is fixed by the value length.
pub fn pack_bytes_var<F: PrimeField>(value: &[UInt8<F>]) -> Result<Vec<FpVar<F>>, SynthesisError> {
    let chunk_size = leaf_chunk_size::<F>();
    let mut elements = Vec::with_capacity(1 + value.len().div_ceil(chunk_size));
    elements.push(FpVar::constant(F::from(value.len() as u64)));
    for chunk in value.chunks(chunk_size) {
        elements.push(Boolean::le_bits_to_fp_var(&chunk.to_bits_le()?)?);
    }
    Ok(elements)
}

impl<F: PrimeField + Absorb> TreeHasher<F> {
    /// Hash a leaf value in-circuit.
    pub fn hash_leaf_var(
        &self,
        cs: ConstraintSystemRef<F>,
        value: &[UInt8<F>],
    ) -> Result<FpVar<F>, SynthesisError> {
        let inputs = pack_bytes_var(value)?;
        poseidon_hash_var(cs, &self.leaf, &inputs)
    }

    /// Compress two child hashes in-circuit.
    pub fn compress_var(
        &self,
        cs: ConstraintSystemRef<F>,
        left: &FpVar<F>,
        right: &FpVar<F>,
    ) -> Result<FpVar<F>, SynthesisError> {
        poseidon_hash_var(cs, &self.node, &[left.clone(), right.clone()])
    }
}

fn poseidon_hash_var<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    config: &PoseidonConfig<F>,
    inputs: &[FpVar<F>],
) -> Result<FpVar<F>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<F>::new(cs, config);
    sponge.absorb(&inputs)?;
    let mut output = sponge.squeeze_field_elements(1)?;
    Ok(output.remove(0))
}
