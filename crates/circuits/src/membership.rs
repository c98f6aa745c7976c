//! Membership and transition verifiers.
//!
//! Every check here is written against [`Composer`], so branches become
//! boolean constraints and the functions behave the same on every backend.
//!
//! Two direction conventions appear and both are intentional:
//! - matching ([`check_membership`], [`check_hash_path`]): bit `0` means the
//!   running value must equal the *left* entry, bit `1` the *right* entry.
//! - sharing ([`update_membership`]): bit `1` means the *left* entry is the
//!   untouched sibling, bit `0` the *right* entry.
//!
//! Both express the same geometry: the index side changes, the sibling side
//! stays.

use ark_ff::PrimeField;
use ark_relations::r1cs::SynthesisError;

use crate::composer::Composer;
use crate::error::TreeError;
use crate::hash_path::HashPathVar;
use crate::index::IndexVar;

/// Circuit boolean: `leaf` sits at `index` under `root` along `hash_path`.
///
/// Does not assert the result. See [`assert_check_membership`].
pub fn check_membership<F, C>(
    composer: &C,
    root: &C::Field,
    hash_path: &HashPathVar<C::Field>,
    leaf: &C::Field,
    index: &IndexVar<C::Bool>,
) -> Result<C::Bool, TreeError>
where
    F: PrimeField,
    C: Composer<F>,
{
    check_shape(hash_path, index)?;

    let mut is_member = composer.const_bool(true);
    let mut current = leaf.clone();
    for (level, (left, right)) in hash_path.levels().iter().enumerate() {
        let matched = matches_side(composer, &current, left, right, index.bit(level))?;
        is_member = composer.and(&is_member, &matched)?;
        current = composer.compress(left, right)?;
    }

    let at_root = composer.is_equal(&current, root)?;
    Ok(composer.and(&is_member, &at_root)?)
}

/// Hard-assert [`check_membership`].
pub fn assert_check_membership<F, C>(
    composer: &C,
    root: &C::Field,
    hash_path: &HashPathVar<C::Field>,
    leaf: &C::Field,
    index: &IndexVar<C::Bool>,
) -> Result<(), TreeError>
where
    F: PrimeField,
    C: Composer<F>,
{
    let is_member = check_membership(composer, root, hash_path, leaf, index)?;
    composer.assert_true(&is_member, "membership")?;
    Ok(())
}

/// Circuit boolean: `hash_path` is internally consistent for `index` and
/// ends at `root`. The leaf value is not bound.
///
/// The running value starts as the compression of level 0, so the first
/// direction check happens at level 1 against that compressed value.
pub fn check_hash_path<F, C>(
    composer: &C,
    root: &C::Field,
    hash_path: &HashPathVar<C::Field>,
    index: &IndexVar<C::Bool>,
) -> Result<C::Bool, TreeError>
where
    F: PrimeField,
    C: Composer<F>,
{
    check_shape(hash_path, index)?;

    let (left, right) = hash_path.level(0);
    let mut current = composer.compress(left, right)?;
    let mut is_valid = composer.const_bool(true);
    for (level, (left, right)) in hash_path.levels().iter().enumerate().skip(1) {
        let matched = matches_side(composer, &current, left, right, index.bit(level))?;
        is_valid = composer.and(&is_valid, &matched)?;
        current = composer.compress(left, right)?;
    }

    let at_root = composer.is_equal(&current, root)?;
    Ok(composer.and(&is_valid, &at_root)?)
}

/// Emit the hard constraints for replacing the leaf at `index`:
///
/// 1. the old path is consistent with `old_root`
/// 2. the new path carries `hash_leaf(new_value)` at `index` up to `new_root`
/// 3. at every level the sibling side is identical in both paths
///
/// Each level of (3) is its own assertion, labelled with the level, so a
/// failure points at the level that broke.
#[allow(clippy::too_many_arguments)]
pub fn update_membership<F, C>(
    composer: &C,
    new_root: &C::Field,
    new_hash_path: &HashPathVar<C::Field>,
    new_value: &C::Bytes,
    old_root: &C::Field,
    old_hash_path: &HashPathVar<C::Field>,
    index: &IndexVar<C::Bool>,
) -> Result<(), TreeError>
where
    F: PrimeField,
    C: Composer<F>,
{
    if old_hash_path.depth() != new_hash_path.depth() {
        return Err(TreeError::DepthMismatch {
            expected: old_hash_path.depth(),
            actual: new_hash_path.depth(),
        });
    }

    let old_valid = check_hash_path(composer, old_root, old_hash_path, index)?;
    composer.assert_true(&old_valid, "old hash path")?;

    let new_leaf = composer.hash_leaf(new_value)?;
    let new_valid = check_membership(composer, new_root, new_hash_path, &new_leaf, index)?;
    composer.assert_true(&new_valid, "new hash path")?;

    for (level, ((old_left, old_right), (new_left, new_right))) in old_hash_path
        .levels()
        .iter()
        .zip(new_hash_path.levels())
        .enumerate()
    {
        let bit = index.bit(level);
        let share_left = composer.and(&composer.is_equal(old_left, new_left)?, bit)?;
        let share_right =
            composer.and(&composer.is_equal(old_right, new_right)?, &composer.not(bit))?;
        let preserved = composer.xor(&share_left, &share_right)?;
        composer.assert_true(&preserved, &format!("level {level} non-interference"))?;
    }

    Ok(())
}

/// `current` equals the entry selected by `bit` (left for 0, right for 1)
/// and the check is attributed to that side only.
fn matches_side<F, C>(
    composer: &C,
    current: &C::Field,
    left: &C::Field,
    right: &C::Field,
    bit: &C::Bool,
) -> Result<C::Bool, SynthesisError>
where
    F: PrimeField,
    C: Composer<F>,
{
    let is_left = composer.and(&composer.is_equal(current, left)?, &composer.not(bit))?;
    let is_right = composer.and(&composer.is_equal(current, right)?, bit)?;
    composer.xor(&is_left, &is_right)
}

fn check_shape<T, B>(hash_path: &HashPathVar<T>, index: &IndexVar<B>) -> Result<(), TreeError>
where
    T: Clone,
    B: Clone,
{
    if hash_path.depth() == 0 {
        return Err(TreeError::PathLength {
            expected: index.depth(),
            actual: 0,
        });
    }
    if hash_path.depth() != index.depth() {
        return Err(TreeError::PathLength {
            expected: index.depth(),
            actual: hash_path.depth(),
        });
    }
    Ok(())
}
