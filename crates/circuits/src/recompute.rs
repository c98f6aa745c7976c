//! Native hash path recomputation after a leaf substitution.

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use tree_hash::TreeHasher;

use crate::error::TreeError;
use crate::hash_path::HashPath;
use crate::index::Side;
use crate::store::HashPathStore;

/// The hash path of `index` after its leaf is replaced by `value`.
///
/// Starts from the stored path, writes `hash_leaf(value)` into the side the
/// index selects at level 0, then walks up: at every level exactly one side
/// is overwritten with the compression of the level below. The store itself
/// is not modified.
pub fn recompute_path<F, S>(
    store: &S,
    hasher: &TreeHasher<F>,
    index: &BigUint,
    value: &[u8],
) -> Result<HashPath<F>, TreeError>
where
    F: PrimeField + Absorb,
    S: HashPathStore<F>,
{
    let mut path = store.get_hash_path(index)?;
    let mut current = hasher.hash_leaf(value);

    for level in 0..path.depth() {
        path.set(level, Side::of(index, level), current);
        let (left, right) = *path.level(level);
        current = hasher.compress(left, right);
    }

    Ok(path)
}
