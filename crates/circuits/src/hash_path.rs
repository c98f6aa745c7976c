//! Hash paths: one `(left, right)` sibling pair per level, leaf level first.

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use ark_relations::r1cs::SynthesisError;
use num_bigint::BigUint;
use tree_hash::TreeHasher;

use crate::composer::Composer;
use crate::config::validate_depth;
use crate::error::TreeError;
use crate::index::Side;

/// Native hash path. Compressing the pair at level `i` gives the value on
/// the index's side at level `i + 1`; compressing the top pair gives the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashPath<F> {
    levels: Vec<(F, F)>,
}

impl<F: PrimeField> HashPath<F> {
    pub fn new(levels: Vec<(F, F)>) -> Result<Self, TreeError> {
        validate_depth(levels.len())?;
        Ok(Self { levels })
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[(F, F)] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> &(F, F) {
        &self.levels[level]
    }

    /// Overwrite one side of the pair at `level`.
    pub fn set(&mut self, level: usize, side: Side, value: F) {
        let pair = &mut self.levels[level];
        match side {
            Side::Left => pair.0 = value,
            Side::Right => pair.1 = value,
        }
    }

    /// The value on `side` at `level`.
    pub fn get(&self, level: usize, side: Side) -> F {
        let (left, right) = self.levels[level];
        match side {
            Side::Left => left,
            Side::Right => right,
        }
    }
}

impl<F: PrimeField + Absorb> HashPath<F> {
    /// Compression of the top pair.
    pub fn root(&self, hasher: &TreeHasher<F>) -> F {
        let (left, right) = self.levels[self.levels.len() - 1];
        hasher.compress(left, right)
    }

    /// Native check that each level feeds the side `index` selects one level
    /// up and that the top pair compresses to `root`.
    pub fn is_consistent(&self, hasher: &TreeHasher<F>, index: &BigUint, root: F) -> bool {
        let mut current = None;
        for (level, &(left, right)) in self.levels.iter().enumerate() {
            if let Some(value) = current {
                if self.get(level, Side::of(index, level)) != value {
                    return false;
                }
            }
            current = Some(hasher.compress(left, right));
        }
        current == Some(root)
    }
}

/// A hash path lifted into a constraint backend.
#[derive(Clone, Debug)]
pub struct HashPathVar<T> {
    levels: Vec<(T, T)>,
}

impl<T: Clone> HashPathVar<T> {
    /// Allocate every pair of `path` as witnesses.
    pub fn new_witness<F, C>(composer: &C, path: &HashPath<F>) -> Result<Self, SynthesisError>
    where
        F: PrimeField,
        C: Composer<F, Field = T>,
    {
        let levels = path
            .levels()
            .iter()
            .map(|&(left, right)| {
                Ok((composer.alloc_witness(left)?, composer.alloc_witness(right)?))
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;
        Ok(Self { levels })
    }

    pub fn constant<F, C>(composer: &C, path: &HashPath<F>) -> Self
    where
        F: PrimeField,
        C: Composer<F, Field = T>,
    {
        let levels = path
            .levels()
            .iter()
            .map(|&(left, right)| (composer.const_value(left), composer.const_value(right)))
            .collect();
        Self { levels }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[(T, T)] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> &(T, T) {
        &self.levels[level]
    }
}
