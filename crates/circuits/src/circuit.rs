//! TransitionCircuit: proves one leaf replacement moves `old_root` to `new_root`.

use std::sync::Arc;

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;
use num_traits::Zero;
use tree_hash::TreeHasher;

use crate::composer::Composer;
use crate::config::validate_depth;
use crate::error::TreeError;
use crate::hash_path::{HashPath, HashPathVar};
use crate::index::{check_index, IndexVar};
use crate::membership::update_membership;
use crate::r1cs::R1csComposer;
use crate::recompute::recompute_path;
use crate::store::HashPathStore;

/// Circuit that proves: "replacing the leaf at `index` with `value` turns
/// `old_root` into `new_root`"
///
/// Public inputs:
/// - old_root: Root before the update
/// - new_root: Root after the update
///
/// Private witnesses:
/// - old_path, new_path: Hash paths of `index` before and after
/// - value: Raw bytes of the new leaf
/// - index: Leaf position, as `depth` bits
#[derive(Clone, Debug)]
pub struct TransitionCircuit<F: PrimeField> {
    /// Public: Root before the update
    pub old_root: Option<F>,
    /// Public: Root after the update
    pub new_root: Option<F>,

    /// Private: Hash path of `index` before the update
    pub old_path: HashPath<F>,
    /// Private: Hash path of `index` after the update
    pub new_path: HashPath<F>,
    /// Private: New leaf value
    pub value: Vec<u8>,
    /// Private: Updated position
    pub index: BigUint,

    pub hasher: Arc<TreeHasher<F>>,
}

impl<F: PrimeField + Absorb> TransitionCircuit<F> {
    /// Create a new circuit instance for proving.
    pub fn new(
        old_root: F,
        new_root: F,
        old_path: HashPath<F>,
        new_path: HashPath<F>,
        value: Vec<u8>,
        index: BigUint,
        hasher: Arc<TreeHasher<F>>,
    ) -> Result<Self, TreeError> {
        if old_path.depth() != new_path.depth() {
            return Err(TreeError::DepthMismatch {
                expected: old_path.depth(),
                actual: new_path.depth(),
            });
        }
        check_index(&index, old_path.depth())?;

        Ok(Self {
            old_root: Some(old_root),
            new_root: Some(new_root),
            old_path,
            new_path,
            value,
            index,
            hasher,
        })
    }

    /// Create an empty circuit for setup.
    ///
    /// The constraint shape depends only on `depth` and `value_len`, so a
    /// key generated from this circuit proves every update of that shape.
    pub fn empty(depth: usize, value_len: usize, hasher: Arc<TreeHasher<F>>) -> Result<Self, TreeError> {
        validate_depth(depth)?;
        let placeholder = HashPath::new(vec![(F::zero(), F::zero()); depth])?;

        Ok(Self {
            old_root: None,
            new_root: None,
            old_path: placeholder.clone(),
            new_path: placeholder,
            value: vec![0u8; value_len],
            index: BigUint::zero(),
            hasher,
        })
    }

    /// Derive every witness for writing `value` at `index` in `store`.
    ///
    /// The store is read, not modified.
    pub fn for_update<S: HashPathStore<F>>(
        store: &S,
        hasher: Arc<TreeHasher<F>>,
        index: &BigUint,
        value: &[u8],
    ) -> Result<Self, TreeError> {
        let old_path = store.get_hash_path(index)?;
        let new_path = recompute_path(store, &hasher, index, value)?;
        let new_root = new_path.root(&hasher);

        Self::new(
            store.root(),
            new_root,
            old_path,
            new_path,
            value.to_vec(),
            index.clone(),
            hasher,
        )
    }

    pub fn depth(&self) -> usize {
        self.old_path.depth()
    }

    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Option<Vec<F>> {
        Some(vec![self.old_root?, self.new_root?])
    }
}

impl<F: PrimeField + Absorb> ConstraintSynthesizer<F> for TransitionCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let depth = self.depth();
        let composer = R1csComposer::new(cs.clone(), self.hasher.clone());

        // 1. Allocate public inputs
        let old_root = FpVar::new_input(cs.clone(), || {
            self.old_root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let new_root = FpVar::new_input(cs.clone(), || {
            self.new_root.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // 2. Allocate private witnesses
        let old_path = HashPathVar::new_witness(&composer, &self.old_path)?;
        let new_path = HashPathVar::new_witness(&composer, &self.new_path)?;
        let value = composer.alloc_bytes(&self.value)?;
        let index =
            IndexVar::new_witness(&composer, &self.index, depth).map_err(synthesis_error)?;

        // 3. Old path, new path and non-interference
        update_membership(
            &composer,
            &new_root,
            &new_path,
            &value,
            &old_root,
            &old_path,
            &index,
        )
        .map_err(synthesis_error)?;

        tracing::debug!(depth, constraints = cs.num_constraints(), "transition circuit synthesized");
        Ok(())
    }
}

fn synthesis_error(err: TreeError) -> SynthesisError {
    match err {
        TreeError::Synthesis(inner) => inner,
        other => {
            tracing::error!(error = %other, "transition circuit has an invalid shape");
            SynthesisError::Unsatisfiable
        }
    }
}
