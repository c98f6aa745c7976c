//! Leaf index representation and the bit-direction convention.
//!
//! Bit `i` of an index (least-significant first) picks the child taken at
//! level `i`: `0` is the left child, `1` the right child. The hash path
//! computer, the in-memory store and the membership verifiers all go
//! through [`Side::of`] / [`index_bit`] natively and [`IndexVar::bit`]
//! in-circuit.

use ark_ff::PrimeField;
use num_bigint::BigUint;

use crate::composer::Composer;
use crate::error::TreeError;

/// Which child of a node the path to a leaf passes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// The side taken by `index` at `level`.
    pub fn of(index: &BigUint, level: usize) -> Self {
        Self::from_bit(index_bit(index, level))
    }

    /// The sibling side.
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Bit `level` of `index`, least-significant first.
pub fn index_bit(index: &BigUint, level: usize) -> bool {
    index.bit(level as u64)
}

/// Reject indices that need more than `depth` bits.
pub fn check_index(index: &BigUint, depth: usize) -> Result<(), TreeError> {
    if index.bits() > depth as u64 {
        return Err(TreeError::IndexOutOfRange {
            index: index.clone(),
            depth,
        });
    }
    Ok(())
}

/// An index as `depth` circuit booleans, least-significant first.
#[derive(Clone, Debug)]
pub struct IndexVar<B> {
    bits: Vec<B>,
}

impl<B: Clone> IndexVar<B> {
    /// Allocate the bits of `index` as witnesses.
    pub fn new_witness<F, C>(composer: &C, index: &BigUint, depth: usize) -> Result<Self, TreeError>
    where
        F: PrimeField,
        C: Composer<F, Bool = B>,
    {
        check_index(index, depth)?;
        let bits = (0..depth)
            .map(|level| composer.alloc_bool(index_bit(index, level)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bits })
    }

    /// The bits of a public index, with no witnesses allocated.
    pub fn constant<F, C>(composer: &C, index: &BigUint, depth: usize) -> Result<Self, TreeError>
    where
        F: PrimeField,
        C: Composer<F, Bool = B>,
    {
        check_index(index, depth)?;
        let bits = (0..depth)
            .map(|level| composer.const_bool(index_bit(index, level)))
            .collect();
        Ok(Self { bits })
    }

    pub fn depth(&self) -> usize {
        self.bits.len()
    }

    pub fn bit(&self, level: usize) -> &B {
        &self.bits[level]
    }

    pub fn bits(&self) -> &[B] {
        &self.bits
    }

    /// Hard-assert that every bit matches the public constant `index`.
    pub fn assert_equal_constant<F, C>(
        &self,
        composer: &C,
        index: &BigUint,
        label: &str,
    ) -> Result<(), TreeError>
    where
        F: PrimeField,
        C: Composer<F, Bool = B>,
    {
        check_index(index, self.depth())?;
        for (level, bit) in self.bits.iter().enumerate() {
            let expected = if index_bit(index, level) {
                bit.clone()
            } else {
                composer.not(bit)
            };
            composer.assert_true(&expected, &format!("{label}: bit {level}"))?;
        }
        Ok(())
    }

    /// A circuit boolean for `self < bound`.
    ///
    /// Scans from the least-significant bit: at each level the running
    /// result is replaced when the bits differ and kept when they agree.
    pub fn is_less_than_constant<F, C>(&self, composer: &C, bound: &BigUint) -> Result<B, TreeError>
    where
        F: PrimeField,
        C: Composer<F, Bool = B>,
    {
        if bound.bits() > self.depth() as u64 {
            return Ok(composer.const_bool(true));
        }

        let mut less = composer.const_bool(false);
        for (level, bit) in self.bits.iter().enumerate() {
            let not_bit = composer.not(bit);
            less = if index_bit(bound, level) {
                composer.or(&not_bit, &less)?
            } else {
                composer.and(&not_bit, &less)?
            };
        }
        Ok(less)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeComposer;
    use ark_bn254::Fr;
    use std::sync::Arc;
    use tree_hash::TreeHasher;

    fn composer() -> NativeComposer<Fr> {
        NativeComposer::new(Arc::new(TreeHasher::new()))
    }

    #[test]
    fn test_side_convention() {
        let index = BigUint::from(0b110u32);
        assert_eq!(Side::of(&index, 0), Side::Left);
        assert_eq!(Side::of(&index, 1), Side::Right);
        assert_eq!(Side::of(&index, 2), Side::Right);
        assert_eq!(Side::of(&index, 3), Side::Left);
        assert_eq!(Side::of(&index, 0).opposite(), Side::Right);
    }

    #[test]
    fn test_index_bits_lsb_first() {
        let composer = composer();
        let index = IndexVar::new_witness(&composer, &BigUint::from(6u32), 4).unwrap();
        assert_eq!(index.bits(), &[false, true, true, false]);
    }

    #[test]
    fn test_index_out_of_range() {
        let composer = composer();
        assert!(matches!(
            IndexVar::new_witness(&composer, &BigUint::from(8u32), 3),
            Err(TreeError::IndexOutOfRange { depth: 3, .. })
        ));
        assert!(IndexVar::new_witness(&composer, &BigUint::from(7u32), 3).is_ok());
    }

    #[test]
    fn test_assert_equal_constant() {
        let composer = composer();
        let index = IndexVar::new_witness(&composer, &BigUint::from(5u32), 3).unwrap();

        index.assert_equal_constant(&composer, &BigUint::from(5u32), "index").unwrap();
        assert!(composer.is_satisfied().unwrap());

        index.assert_equal_constant(&composer, &BigUint::from(4u32), "index").unwrap();
        assert_eq!(composer.failures(), vec!["index: bit 0".to_string()]);
    }

    #[test]
    fn test_less_than_exhaustive() {
        let composer = composer();
        for value in 0u32..8 {
            let index = IndexVar::new_witness(&composer, &BigUint::from(value), 3).unwrap();
            for bound in 0u32..=9 {
                let less = index
                    .is_less_than_constant(&composer, &BigUint::from(bound))
                    .unwrap();
                assert_eq!(less, value < bound, "{} < {}", value, bound);
            }
        }
    }
}
