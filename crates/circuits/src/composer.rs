//! The capability set the tree gadgets need from a constraint backend.
//!
//! Verifiers are written once against [`Composer`] and run unchanged on the
//! plain evaluator ([`crate::NativeComposer`]) and on an R1CS constraint
//! system ([`crate::R1csComposer`]).

use std::fmt::Debug;

use ark_ff::PrimeField;
use ark_relations::r1cs::SynthesisError;
use tree_hash::TreeHasher;

/// Witness allocation, boolean logic, equality, hard assertions and the two
/// tree hash functions over one constraint backend.
///
/// Hard assertions never fail eagerly on a bad witness. A violated assertion
/// makes the backend unsatisfiable, which [`Composer::is_satisfied`] reports.
pub trait Composer<F: PrimeField> {
    /// A field element, constant or witness.
    type Field: Clone + Debug;
    /// A field element constrained to {0, 1}.
    type Bool: Clone + Debug;
    /// A byte string, used for raw leaf values.
    type Bytes: Clone + Debug;

    fn alloc_witness(&self, value: F) -> Result<Self::Field, SynthesisError>;

    /// A constant; no witness is allocated.
    fn const_value(&self, value: F) -> Self::Field;

    fn alloc_bool(&self, value: bool) -> Result<Self::Bool, SynthesisError>;

    fn const_bool(&self, value: bool) -> Self::Bool;

    fn alloc_bytes(&self, value: &[u8]) -> Result<Self::Bytes, SynthesisError>;

    fn is_equal(&self, a: &Self::Field, b: &Self::Field) -> Result<Self::Bool, SynthesisError>;

    fn and(&self, a: &Self::Bool, b: &Self::Bool) -> Result<Self::Bool, SynthesisError>;

    fn xor(&self, a: &Self::Bool, b: &Self::Bool) -> Result<Self::Bool, SynthesisError>;

    fn not(&self, a: &Self::Bool) -> Self::Bool;

    fn or(&self, a: &Self::Bool, b: &Self::Bool) -> Result<Self::Bool, SynthesisError> {
        let neither = self.and(&self.not(a), &self.not(b))?;
        Ok(self.not(&neither))
    }

    /// Hard constraint: `value` must be true. `label` names the obligation.
    fn assert_true(&self, value: &Self::Bool, label: &str) -> Result<(), SynthesisError>;

    /// Hard constraint: `value` must equal the public constant `constant`.
    fn assert_equal_constant(
        &self,
        value: &Self::Field,
        constant: F,
        label: &str,
    ) -> Result<(), SynthesisError>;

    /// Leaf hash of a raw value.
    fn hash_leaf(&self, value: &Self::Bytes) -> Result<Self::Field, SynthesisError>;

    /// Two-to-one compression of sibling hashes.
    fn compress(&self, left: &Self::Field, right: &Self::Field)
        -> Result<Self::Field, SynthesisError>;

    /// The assigned value, if the backend has one.
    fn field_value(&self, value: &Self::Field) -> Option<F>;

    fn bool_value(&self, value: &Self::Bool) -> Option<bool>;

    /// Whether every hard assertion emitted so far holds.
    fn is_satisfied(&self) -> Result<bool, SynthesisError>;

    /// The hash functions bound to this backend. Native path computation
    /// must use the same instance.
    fn hasher(&self) -> &TreeHasher<F>;
}
