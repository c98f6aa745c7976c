//! Merkle tree membership and update gadgets.
//!
//! This crate provides:
//! - `check_membership` / `check_hash_path`: circuit booleans for a leaf and
//!   a hash path under a root
//! - `update_membership`: hard constraints for one leaf replacement
//! - `MerkleTree`: an append-and-update tree that proves each transition
//! - `TransitionCircuit`: a single update as a `ConstraintSynthesizer`
//!
//! Every gadget is written against [`Composer`] and runs on either the
//! plain evaluator ([`NativeComposer`]) or an R1CS system ([`R1csComposer`]).

pub mod circuit;
pub mod composer;
pub mod config;
pub mod error;
pub mod hash_path;
pub mod index;
pub mod membership;
pub mod native;
pub mod r1cs;
pub mod recompute;
pub mod store;
pub mod tree;

#[cfg(test)]
mod tests;

pub use circuit::TransitionCircuit;
pub use composer::Composer;
pub use config::{TreeConfig, UpdatePolicy, DEFAULT_DEPTH};
pub use error::TreeError;
pub use hash_path::{HashPath, HashPathVar};
pub use index::{check_index, index_bit, IndexVar, Side};
pub use membership::{assert_check_membership, check_hash_path, check_membership, update_membership};
pub use native::NativeComposer;
pub use r1cs::R1csComposer;
pub use recompute::recompute_path;
pub use store::{HashPathStore, MemoryStore, EMPTY_LEAF};
pub use tree::MerkleTree;
pub use tree_hash::TreeHasher;

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;

/// Deepest supported tree.
pub const MAX_DEPTH: usize = 256;
