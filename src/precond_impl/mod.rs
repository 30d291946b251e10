//! Preconditioners for the Davidson correction vector
//!
//! Given the residual `r` of the current root and its energy `ω`, a
//! preconditioner returns the correction `q = r / (ω - D)` where `D` is a cheap
//! diagonal approximation of the operator. Entries with `ω - D == 0` are left
//! unchanged instead of being divided.
//!
//! For excitation blocks restricted to an active (P-space) subset of
//! multi-indices, only the active canonical entries are divided. Every other
//! entry of the block, including all permutation images, is forced to a zero
//! carrying the sign of its permutation.

mod diagonal;
mod pspace;

pub use diagonal::DiagonalPreconditioner;
pub use pspace::{zero_outside_pspace, PSpaceMask};

use nalgebra::DVector;

/// Correction-vector builder used by the iterative eigensolvers.
pub trait Preconditioner {
    /// Length of the packed vectors the preconditioner expects.
    fn dim(&self) -> usize;

    /// Build the correction vector for `residual` at energy `omega`.
    fn precondition(&self, residual: &DVector<f64>, omega: f64) -> DVector<f64>;
}

impl<T: Preconditioner + ?Sized> Preconditioner for &T {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn precondition(&self, residual: &DVector<f64>, omega: f64) -> DVector<f64> {
        (**self).precondition(residual, omega)
    }
}

/// Element-wise `residual / (omega - diagonal)`, leaving the residual as is on an exact zero.
pub(crate) fn divide_by_shifted(residual: f64, diagonal: f64, omega: f64) -> f64 {
    let denom = omega - diagonal;
    if denom == 0.0 {
        residual
    } else {
        residual / denom
    }
}

#[cfg(test)]
mod tests;
