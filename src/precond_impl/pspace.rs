//! Active-space (P-space) masks for restricted excitation blocks

use crate::tensor::{flat_index, BlockSpec};
use std::collections::HashSet;

/// Set of active canonical multi-indices of one excitation block.
///
/// A multi-index is canonical when it is strictly increasing inside every group
/// of same-space axes. Membership queries accept any ordering and are answered
/// for the canonical representative.
#[derive(Debug, Clone)]
pub struct PSpaceMask {
    block: BlockSpec,
    active: HashSet<Vec<usize>>,
}

impl PSpaceMask {
    /// Mask with no active entries.
    pub fn new(block: BlockSpec) -> Self {
        PSpaceMask {
            block,
            active: HashSet::new(),
        }
    }

    /// Mask with every canonical entry of the block active.
    pub fn full(block: BlockSpec, no: usize, nu: usize) -> Self {
        let active = block.canonical_indices(no, nu).into_iter().collect();
        PSpaceMask { block, active }
    }

    pub fn from_indices<I>(block: BlockSpec, indices: I) -> Self
    where
        I: IntoIterator<Item = Vec<usize>>,
    {
        let mut mask = Self::new(block);
        for index in indices {
            mask.activate(&index);
        }
        mask
    }

    pub fn block(&self) -> &BlockSpec {
        &self.block
    }

    /// Number of active canonical entries.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Mark the canonical representative of `index` as active.
    ///
    /// Indices with a repeated value inside a group are identically zero and are ignored.
    pub fn activate(&mut self, index: &[usize]) {
        if let Some(canonical) = self.canonicalize(index) {
            self.active.insert(canonical);
        }
    }

    pub fn is_active(&self, index: &[usize]) -> bool {
        self.canonicalize(index)
            .is_some_and(|canonical| self.active.contains(&canonical))
    }

    fn canonicalize(&self, index: &[usize]) -> Option<Vec<usize>> {
        if index.len() != self.block.rank() {
            return None;
        }
        let mut canonical = index.to_vec();
        for group in self.block.groups() {
            let mut values: Vec<usize> = group.iter().map(|&axis| index[axis]).collect();
            values.sort_unstable();
            if values.windows(2).any(|w| w[0] == w[1]) {
                return None;
            }
            for (&axis, value) in group.iter().zip(values) {
                canonical[axis] = value;
            }
        }
        Some(canonical)
    }

    /// Rewrite a whole block from its canonical entries.
    ///
    /// Every entry of `out` is first cleared. Each canonical multi-index then gets
    /// `value(flat)` when active and zero otherwise, written with the parity sign
    /// to all of its permutation images.
    pub(crate) fn fill_block<F>(&self, no: usize, nu: usize, out: &mut [f64], value: F)
    where
        F: Fn(usize) -> f64,
    {
        let shape = self.block.shape(no, nu);
        out.iter_mut().for_each(|x| *x = 0.0);
        for canonical in self.block.canonical_indices(no, nu) {
            let v = if self.active.contains(&canonical) {
                value(flat_index(&shape, &canonical))
            } else {
                0.0
            };
            for (image, sign) in self.block.permutation_images(&canonical) {
                out[flat_index(&shape, &image)] = sign * v;
            }
        }
    }
}

/// Zero every entry of a packed block outside the active space, keeping the
/// antisymmetry (and the sign of the zeros) consistent across permutation images.
pub fn zero_outside_pspace(block: &mut [f64], mask: &PSpaceMask, no: usize, nu: usize) {
    let original = block.to_vec();
    mask.fill_block(no, nu, block, |flat| original[flat]);
}
