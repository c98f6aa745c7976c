//! Tree configuration.

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::MAX_DEPTH;

/// Default tree depth (2^32 leaves).
pub const DEFAULT_DEPTH: usize = 32;

/// Which indices `update_member` accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Updates must target an already appended slot. Enforced in-circuit as
    /// `index < size`.
    #[default]
    AppendedOnly,
    /// Any slot below `2^depth` may be updated, including slots that have
    /// not been appended yet.
    AnySlot,
}

/// Configuration for a [`crate::MerkleTree`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Number of levels between a leaf and the root
    pub depth: usize,
    /// Bound applied to in-place updates
    pub update_policy: UpdatePolicy,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            update_policy: UpdatePolicy::AppendedOnly,
        }
    }
}

impl TreeConfig {
    pub fn with_depth(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// Updates may target any slot.
    pub fn permissive(depth: usize) -> Self {
        Self {
            depth,
            update_policy: UpdatePolicy::AnySlot,
        }
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        validate_depth(self.depth)
    }

    /// `2^depth`
    pub fn total_size(&self) -> BigUint {
        BigUint::one() << self.depth
    }
}

pub fn validate_depth(depth: usize) -> Result<(), TreeError> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(TreeError::InvalidDepth { depth });
    }
    Ok(())
}
