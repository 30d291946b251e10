//! Iterative eigensolvers for one root of a non-Hermitian operator
//!
//! # Overview
//!
//! [`Davidson`] is the workhorse: a subspace method with restart, deflation and
//! root following. [`RayleighQuotientSolver`] is a cheaper single-vector
//! fixed-point iteration. Both talk to the problem only through
//! [`crate::SigmaOperator`] and [`crate::Preconditioner`], and report progress
//! through an [`IterationObserver`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use eomcc::{Davidson, DavidsonParams, DenseOperator, DiagonalPreconditioner, TracingObserver};
//!
//! let op = DenseOperator::new(matrix);
//! let precond = DiagonalPreconditioner::new(matrix.diagonal());
//! let solver = Davidson::new(&op, &precond, DavidsonParams::default());
//! let root = solver.solve(&guess, omega0, &mut TracingObserver)?;
//! ```

mod davidson;
mod observer;
mod rayleigh;

pub use davidson::{Davidson, DavidsonParams};
pub use observer::{HistoryObserver, IterationObserver, IterationRecord, TracingObserver};
pub use rayleigh::{RayleighParams, RayleighQuotientSolver};

use nalgebra::DVector;

/// Result of one root solve.
#[derive(Debug, Clone)]
pub struct EigenSolution {
    /// Final eigenvalue estimate
    pub omega: f64,
    /// Final eigenvector estimate, unit norm in the packed space
    pub vector: DVector<f64>,
    pub residual_norm: f64,
    /// Change of `omega` in the last iteration
    pub delta_omega: f64,
    pub iterations: usize,
    /// False when `max_iterations` ran out first
    pub converged: bool,
}

#[cfg(test)]
mod tests;
