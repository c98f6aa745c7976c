//! Plain evaluator backend.
//!
//! Computes every value directly and records failed hard assertions instead
//! of emitting constraints. Useful for testing the tree logic without the
//! cost of R1CS synthesis.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use ark_relations::r1cs::SynthesisError;
use tree_hash::TreeHasher;

use crate::composer::Composer;

/// Evaluates gadgets natively: `Field = F`, `Bool = bool`.
#[derive(Debug)]
pub struct NativeComposer<F: PrimeField> {
    hasher: Arc<TreeHasher<F>>,
    failures: RefCell<Vec<String>>,
    witnesses: Cell<usize>,
    assertions: Cell<usize>,
}

impl<F: PrimeField + Absorb> NativeComposer<F> {
    pub fn new(hasher: Arc<TreeHasher<F>>) -> Self {
        Self {
            hasher,
            failures: RefCell::new(Vec::new()),
            witnesses: Cell::new(0),
            assertions: Cell::new(0),
        }
    }

    /// Labels of the hard assertions that did not hold, in emission order.
    pub fn failures(&self) -> Vec<String> {
        self.failures.borrow().clone()
    }

    pub fn num_witnesses(&self) -> usize {
        self.witnesses.get()
    }

    pub fn num_assertions(&self) -> usize {
        self.assertions.get()
    }

    fn record(&self, holds: bool, label: &str) {
        self.assertions.set(self.assertions.get() + 1);
        if !holds {
            tracing::warn!(label, "hard assertion does not hold");
            self.failures.borrow_mut().push(label.to_string());
        }
    }

    fn count_witnesses(&self, n: usize) {
        self.witnesses.set(self.witnesses.get() + n);
    }
}

impl<F: PrimeField + Absorb> Composer<F> for NativeComposer<F> {
    type Field = F;
    type Bool = bool;
    type Bytes = Vec<u8>;

    fn alloc_witness(&self, value: F) -> Result<F, SynthesisError> {
        self.count_witnesses(1);
        Ok(value)
    }

    fn const_value(&self, value: F) -> F {
        value
    }

    fn alloc_bool(&self, value: bool) -> Result<bool, SynthesisError> {
        self.count_witnesses(1);
        Ok(value)
    }

    fn const_bool(&self, value: bool) -> bool {
        value
    }

    fn alloc_bytes(&self, value: &[u8]) -> Result<Vec<u8>, SynthesisError> {
        self.count_witnesses(value.len());
        Ok(value.to_vec())
    }

    fn is_equal(&self, a: &F, b: &F) -> Result<bool, SynthesisError> {
        Ok(a == b)
    }

    fn and(&self, a: &bool, b: &bool) -> Result<bool, SynthesisError> {
        Ok(*a & *b)
    }

    fn xor(&self, a: &bool, b: &bool) -> Result<bool, SynthesisError> {
        Ok(*a ^ *b)
    }

    fn not(&self, a: &bool) -> bool {
        !*a
    }

    fn assert_true(&self, value: &bool, label: &str) -> Result<(), SynthesisError> {
        self.record(*value, label);
        Ok(())
    }

    fn assert_equal_constant(&self, value: &F, constant: F, label: &str) -> Result<(), SynthesisError> {
        self.record(*value == constant, label);
        Ok(())
    }

    fn hash_leaf(&self, value: &Vec<u8>) -> Result<F, SynthesisError> {
        Ok(self.hasher.hash_leaf(value))
    }

    fn compress(&self, left: &F, right: &F) -> Result<F, SynthesisError> {
        Ok(self.hasher.compress(*left, *right))
    }

    fn field_value(&self, value: &F) -> Option<F> {
        Some(*value)
    }

    fn bool_value(&self, value: &bool) -> Option<bool> {
        Some(*value)
    }

    fn is_satisfied(&self) -> Result<bool, SynthesisError> {
        Ok(self.failures.borrow().is_empty())
    }

    fn hasher(&self) -> &TreeHasher<F> {
        &self.hasher
    }
}
