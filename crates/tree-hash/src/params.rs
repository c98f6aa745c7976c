//! Poseidon parameter sets for the leaf and node sponges.

use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// S-box exponent shared by both sponges.
pub const ALPHA: u64 = 5;
/// Full rounds shared by both sponges.
pub const FULL_ROUNDS: usize = 8;

/// Leaf sponge rate. Wide so long values need few permutations.
pub const LEAF_RATE: usize = 4;
pub const LEAF_PARTIAL_ROUNDS: usize = 60;

/// Node sponge rate. One permutation per two-to-one compression.
pub const NODE_RATE: usize = 2;
pub const NODE_PARTIAL_ROUNDS: usize = 57;

/// Parameters for hashing raw leaf values.
pub fn leaf_config<F: PrimeField>() -> PoseidonConfig<F> {
    poseidon_config(LEAF_RATE, LEAF_PARTIAL_ROUNDS)
}

/// Parameters for compressing two child hashes.
pub fn node_config<F: PrimeField>() -> PoseidonConfig<F> {
    poseidon_config(NODE_RATE, NODE_PARTIAL_ROUNDS)
}

/// Round constants and MDS matrix come from the Grain LFSR, so the
/// parameters are deterministic for a given field, rate and round count.
fn poseidon_config<F: PrimeField>(rate: usize, partial_rounds: usize) -> PoseidonConfig<F> {
    let (ark, mds) = find_poseidon_ark_and_mds::<F>(
        F::MODULUS_BIT_SIZE as u64,
        rate,
        FULL_ROUNDS as u64,
        partial_rounds as u64,
        0,
    );

    PoseidonConfig::new(
        FULL_ROUNDS,
        partial_rounds,
        ALPHA,
        mds,
        ark,
        rate,
        1, // capacity
    )
}
