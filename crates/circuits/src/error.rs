//! Precondition errors for tree operations.
//!
//! These are native failures reported at the call site. A witness that
//! violates a hard constraint is never an error here: it leaves the
//! constraint system unsatisfiable instead.

use ark_relations::r1cs::SynthesisError;
use num_bigint::BigUint;
use thiserror::Error;

/// Errors raised before or during constraint emission
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Tree depth {depth} is outside 1..={max}", max = crate::MAX_DEPTH)]
    InvalidDepth { depth: usize },
    #[error("Tree is full ({capacity} leaves)")]
    TreeFull { capacity: BigUint },
    #[error("Index {index} does not fit in a tree of depth {depth}")]
    IndexOutOfRange { index: BigUint, depth: usize },
    #[error("Hash path has {actual} levels, expected {expected}")]
    PathLength { expected: usize, actual: usize },
    #[error("Depth mismatch: expected {expected}, got {actual}")]
    DepthMismatch { expected: usize, actual: usize },
    #[error("Constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}
