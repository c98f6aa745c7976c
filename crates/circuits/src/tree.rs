//! Append-and-update Merkle tree driven through a constraint backend.

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::composer::Composer;
use crate::config::{TreeConfig, UpdatePolicy};
use crate::error::TreeError;
use crate::hash_path::{HashPath, HashPathVar};
use crate::index::{check_index, IndexVar};
use crate::membership::{check_membership, update_membership};
use crate::recompute::recompute_path;
use crate::store::HashPathStore;

/// A fixed-depth tree whose every transition is proven in `composer`.
///
/// `root` and `size` are local state mirrored by constraints: each
/// [`add_member`](Self::add_member) or [`update_member`](Self::update_member)
/// emits a full transition proof before the store is touched. Single owner;
/// callers serialise mutations.
///
/// The store must hash with the same [`tree_hash::TreeHasher`] as the
/// composer.
pub struct MerkleTree<'a, F, C, S>
where
    F: PrimeField,
    C: Composer<F>,
    S: HashPathStore<F>,
{
    composer: &'a C,
    store: S,
    config: TreeConfig,
    root: C::Field,
    root_value: F,
    size: BigUint,
    total_size: BigUint,
}

impl<'a, F, C, S> MerkleTree<'a, F, C, S>
where
    F: PrimeField + Absorb,
    C: Composer<F>,
    S: HashPathStore<F>,
{
    /// Start an empty tree (`size = 0`) over `store`, witnessing its root.
    pub fn new(composer: &'a C, store: S, config: TreeConfig) -> Result<Self, TreeError> {
        config.validate()?;
        if store.depth() != config.depth {
            return Err(TreeError::DepthMismatch {
                expected: config.depth,
                actual: store.depth(),
            });
        }

        let root_value = store.root();
        let root = composer.alloc_witness(root_value)?;
        let total_size = config.total_size();

        Ok(Self {
            composer,
            store,
            config,
            root,
            root_value,
            size: BigUint::zero(),
            total_size,
        })
    }

    /// Write `value` at the next free slot.
    ///
    /// The index witness is pinned to the public slot number, so a prover
    /// cannot append anywhere else.
    pub fn add_member(&mut self, value: &[u8]) -> Result<(), TreeError> {
        if self.size >= self.total_size {
            return Err(TreeError::TreeFull {
                capacity: self.total_size.clone(),
            });
        }

        let composer = self.composer;
        let index = self.size.clone();
        let index_var = IndexVar::new_witness(composer, &index, self.depth())?;
        index_var.assert_equal_constant(composer, &index, "append index")?;

        self.transition(&index_var, &index, value)?;
        self.size += 1u32;

        tracing::debug!(index = %index, size = %self.size, "appended member");
        Ok(())
    }

    /// Overwrite the slot at `index` with `value`. `size` is unchanged.
    ///
    /// Under [`UpdatePolicy::AppendedOnly`] the circuit also proves
    /// `index < size`.
    pub fn update_member(&mut self, value: &[u8], index: &BigUint) -> Result<(), TreeError> {
        check_index(index, self.depth())?;

        let composer = self.composer;
        let index_var = IndexVar::new_witness(composer, index, self.depth())?;
        if self.config.update_policy == UpdatePolicy::AppendedOnly {
            let below = index_var.is_less_than_constant(composer, &self.size)?;
            composer.assert_true(&below, "update index below size")?;
        }

        self.transition(&index_var, index, value)?;

        tracing::debug!(index = %index, size = %self.size, "updated member");
        Ok(())
    }

    /// Circuit boolean: `value` is the leaf at `index` under the current root.
    pub fn check_member(&self, value: &[u8], index: &BigUint) -> Result<C::Bool, TreeError> {
        let composer = self.composer;
        let path = HashPathVar::new_witness(composer, &self.store.get_hash_path(index)?)?;
        let leaf = composer.hash_leaf(&composer.alloc_bytes(value)?)?;
        let index_var = IndexVar::new_witness(composer, index, self.depth())?;
        check_membership(composer, &self.root, &path, &leaf, &index_var)
    }

    /// Hard-assert [`check_member`](Self::check_member).
    pub fn assert_member(&self, value: &[u8], index: &BigUint) -> Result<(), TreeError> {
        let is_member = self.check_member(value, index)?;
        self.composer.assert_true(&is_member, "member")?;
        Ok(())
    }

    pub fn root(&self) -> &C::Field {
        &self.root
    }

    /// Native value of the current root.
    pub fn root_value(&self) -> F {
        self.root_value
    }

    pub fn size(&self) -> &BigUint {
        &self.size
    }

    pub fn total_size(&self) -> &BigUint {
        &self.total_size
    }

    pub fn depth(&self) -> usize {
        self.config.depth
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hash_path(&self, index: &BigUint) -> Result<HashPath<F>, TreeError> {
        self.store.get_hash_path(index)
    }

    fn transition(
        &mut self,
        index_var: &IndexVar<C::Bool>,
        index: &BigUint,
        value: &[u8],
    ) -> Result<(), TreeError> {
        let composer = self.composer;
        let hasher = composer.hasher();

        let old_path = self.store.get_hash_path(index)?;
        let new_path = recompute_path(&self.store, hasher, index, value)?;
        let new_root_value = new_path.root(hasher);

        let new_root = composer.alloc_witness(new_root_value)?;
        let old_path_var = HashPathVar::new_witness(composer, &old_path)?;
        let new_path_var = HashPathVar::new_witness(composer, &new_path)?;
        let value_var = composer.alloc_bytes(value)?;

        update_membership(
            composer,
            &new_root,
            &new_path_var,
            &value_var,
            &self.root,
            &old_path_var,
            index_var,
        )?;

        self.store.update_element(index, value)?;
        self.root = new_root;
        self.root_value = new_root_value;
        Ok(())
    }
}
