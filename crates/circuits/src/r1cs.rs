//! R1CS backend over an arkworks constraint system.

use std::sync::Arc;

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use ark_r1cs_std::{
    fields::{fp::FpVar, FieldVar},
    prelude::*,
};
use ark_relations::{
    lc,
    r1cs::{ConstraintSystemRef, SynthesisError, Variable},
};
use tree_hash::TreeHasher;

use crate::composer::Composer;

/// Emits constraints into a [`ConstraintSystemRef`].
pub struct R1csComposer<F: PrimeField> {
    cs: ConstraintSystemRef<F>,
    hasher: Arc<TreeHasher<F>>,
}

impl<F: PrimeField + Absorb> R1csComposer<F> {
    pub fn new(cs: ConstraintSystemRef<F>, hasher: Arc<TreeHasher<F>>) -> Self {
        Self { cs, hasher }
    }

    pub fn num_constraints(&self) -> usize {
        self.cs.num_constraints()
    }

    pub fn num_witnesses(&self) -> usize {
        self.cs.num_witness_variables()
    }

    /// `0 * 0 = 1`. Used when an assertion over constants is already known
    /// to fail, so the system becomes unsatisfiable rather than erroring.
    fn enforce_unsatisfiable(&self) -> Result<(), SynthesisError> {
        self.cs
            .enforce_constraint(lc!(), lc!(), lc!() + Variable::One)
    }
}

impl<F: PrimeField + Absorb> Composer<F> for R1csComposer<F> {
    type Field = FpVar<F>;
    type Bool = Boolean<F>;
    type Bytes = Vec<UInt8<F>>;

    fn alloc_witness(&self, value: F) -> Result<FpVar<F>, SynthesisError> {
        FpVar::new_witness(self.cs.clone(), || Ok(value))
    }

    fn const_value(&self, value: F) -> FpVar<F> {
        FpVar::constant(value)
    }

    fn alloc_bool(&self, value: bool) -> Result<Boolean<F>, SynthesisError> {
        Boolean::new_witness(self.cs.clone(), || Ok(value))
    }

    fn const_bool(&self, value: bool) -> Boolean<F> {
        Boolean::constant(value)
    }

    fn alloc_bytes(&self, value: &[u8]) -> Result<Vec<UInt8<F>>, SynthesisError> {
        UInt8::new_witness_vec(self.cs.clone(), value)
    }

    fn is_equal(&self, a: &FpVar<F>, b: &FpVar<F>) -> Result<Boolean<F>, SynthesisError> {
        a.is_eq(b)
    }

    fn and(&self, a: &Boolean<F>, b: &Boolean<F>) -> Result<Boolean<F>, SynthesisError> {
        a.and(b)
    }

    fn xor(&self, a: &Boolean<F>, b: &Boolean<F>) -> Result<Boolean<F>, SynthesisError> {
        a.xor(b)
    }

    fn not(&self, a: &Boolean<F>) -> Boolean<F> {
        a.not()
    }

    fn assert_true(&self, value: &Boolean<F>, label: &str) -> Result<(), SynthesisError> {
        tracing::trace!(label, "enforce true");
        match value {
            Boolean::Constant(true) => Ok(()),
            Boolean::Constant(false) => self.enforce_unsatisfiable(),
            _ => value.enforce_equal(&Boolean::TRUE),
        }
    }

    fn assert_equal_constant(
        &self,
        value: &FpVar<F>,
        constant: F,
        label: &str,
    ) -> Result<(), SynthesisError> {
        tracing::trace!(label, "enforce equal to constant");
        match value {
            FpVar::Constant(c) if *c == constant => Ok(()),
            FpVar::Constant(_) => self.enforce_unsatisfiable(),
            FpVar::Var(_) => value.enforce_equal(&FpVar::constant(constant)),
        }
    }

    fn hash_leaf(&self, value: &Vec<UInt8<F>>) -> Result<FpVar<F>, SynthesisError> {
        self.hasher.hash_leaf_var(self.cs.clone(), value)
    }

    fn compress(&self, left: &FpVar<F>, right: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
        self.hasher.compress_var(self.cs.clone(), left, right)
    }

    fn field_value(&self, value: &FpVar<F>) -> Option<F> {
        value.value().ok()
    }

    fn bool_value(&self, value: &Boolean<F>) -> Option<bool> {
        value.value().ok()
    }

    fn is_satisfied(&self) -> Result<bool, SynthesisError> {
        self.cs.is_satisfied()
    }

    fn hasher(&self) -> &TreeHasher<F> {
        &self.hasher
    }
}
