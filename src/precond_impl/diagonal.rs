//! Diagonal (Jacobi-style) preconditioner with optional P-space blocks

use super::{divide_by_shifted, PSpaceMask, Preconditioner};
use crate::error::SolverError;
use crate::tensor::PackedLayout;
use nalgebra::DVector;
use tracing::debug;

/// `q = r / (ω - D)` with a fixed diagonal `D`.
#[derive(Debug, Clone)]
pub struct DiagonalPreconditioner {
    diagonal: DVector<f64>,
    layout: Option<PackedLayout>,
    masks: Vec<(usize, PSpaceMask)>,
}

impl DiagonalPreconditioner {
    /// Preconditioner from an explicit diagonal.
    pub fn new(diagonal: DVector<f64>) -> Self {
        DiagonalPreconditioner {
            diagonal,
            layout: None,
            masks: Vec::new(),
        }
    }

    /// Orbital-energy-difference diagonal for every block of `layout`.
    ///
    /// Each entry is the sum of the unoccupied energies minus the sum of the
    /// occupied energies of its multi-index, so a one-hole IP entry is `-eps_i`
    /// and a two-hole DIP entry is `-eps_i - eps_j`.
    pub fn from_layout(layout: &PackedLayout, eps_occ: &[f64], eps_unocc: &[f64]) -> Self {
        DiagonalPreconditioner {
            diagonal: layout.diagonal(eps_occ, eps_unocc),
            layout: Some(layout.clone()),
            masks: Vec::new(),
        }
    }

    /// Restrict block `block` of the layout to the active entries of `mask`.
    pub fn with_pspace(mut self, block: usize, mask: PSpaceMask) -> Result<Self, SolverError> {
        let matches = self
            .layout
            .as_ref()
            .and_then(|layout| layout.blocks().get(block))
            .is_some_and(|spec| spec == mask.block());
        if !matches {
            return Err(SolverError::PSpaceBlock { block });
        }
        debug!(
            "P-space on block {}: {} active canonical entries",
            block,
            mask.len()
        );
        self.masks.push((block, mask));
        Ok(self)
    }

    pub fn diagonal(&self) -> &DVector<f64> {
        &self.diagonal
    }
}

impl Preconditioner for DiagonalPreconditioner {
    fn dim(&self) -> usize {
        self.diagonal.len()
    }

    fn precondition(&self, residual: &DVector<f64>, omega: f64) -> DVector<f64> {
        let mut out = residual.zip_map(&self.diagonal, |r, d| divide_by_shifted(r, d, omega));
        if let Some(layout) = &self.layout {
            for (block, mask) in &self.masks {
                let offset = layout.offset(*block);
                let len = layout.block_len(*block);
                let res = &residual.as_slice()[offset..offset + len];
                let diag = &self.diagonal.as_slice()[offset..offset + len];
                mask.fill_block(
                    layout.no(),
                    layout.nu(),
                    &mut out.as_mut_slice()[offset..offset + len],
                    |flat| divide_by_shifted(res[flat], diag[flat], omega),
                );
            }
        }
        out
    }
}
