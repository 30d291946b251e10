//! Non-Hermitian Davidson eigensolver with restart and root following
//!
//! The solver tracks a single root. Each iteration diagonalizes the projected
//! matrix `G = B^T (H B)`, picks one eigenpair according to the root-selection
//! rule, forms the Ritz vector `R = B α` and the residual `(H B) α - ω R`, and
//! expands the basis with the Gram-Schmidt-orthogonalized preconditioned
//! residual (Olsen-corrected by default). The last `restart_depth` Ritz vectors are kept in a ring buffer;
//! when the basis is full it is collapsed to an orthonormal basis of that buffer,
//! current Ritz vector first, and the new correction is appended to it.

use super::observer::{IterationObserver, IterationRecord};
use super::EigenSolution;
use crate::eigen::{eigenpairs, RootSelection};
use crate::error::SolverError;
use crate::operator::SigmaOperator;
use crate::precond_impl::Preconditioner;
use crate::tensor::pad_to;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Corrections smaller than this after orthogonalization are linearly dependent.
const LINEAR_DEPENDENCE_TOL: f64 = 1e-12;

/// Iteration controls of the Davidson solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DavidsonParams {
    pub max_iterations: usize,
    /// Convergence requires both `|r| < threshold` and `|Δω| < threshold`
    pub convergence_threshold: f64,
    /// Largest number of basis vectors before a restart
    pub max_subspace_size: usize,
    /// Number of recent Ritz vectors kept across a restart
    pub restart_depth: usize,
    pub root_selection: RootSelection,
    /// Largest imaginary part accepted on the selected subspace eigenvalue
    pub imaginary_tolerance: f64,
    /// Project the current Ritz vector out of the preconditioned residual (Olsen correction)
    #[serde(default = "default_olsen")]
    pub olsen_correction: bool,
}

fn default_olsen() -> bool {
    true
}

impl Default for DavidsonParams {
    fn default() -> Self {
        DavidsonParams {
            max_iterations: 80,
            convergence_threshold: 1e-7,
            max_subspace_size: 20,
            restart_depth: 1,
            root_selection: RootSelection::MaxOverlap,
            imaginary_tolerance: 1e-6,
            olsen_correction: true,
        }
    }
}

/// Davidson solver bound to one operator and one preconditioner.
pub struct Davidson<'a, O: ?Sized, P: ?Sized> {
    operator: &'a O,
    preconditioner: &'a P,
    params: DavidsonParams,
}

impl<'a, O, P> Davidson<'a, O, P>
where
    O: SigmaOperator + ?Sized,
    P: Preconditioner + ?Sized,
{
    pub fn new(operator: &'a O, preconditioner: &'a P, params: DavidsonParams) -> Self {
        Davidson {
            operator,
            preconditioner,
            params,
        }
    }

    pub fn params(&self) -> &DavidsonParams {
        &self.params
    }

    fn sigma(&self, omega: f64, x: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        let y = self.operator.apply(omega, x)?;
        if y.len() != x.len() {
            return Err(SolverError::OperatorDimension {
                expected: x.len(),
                found: y.len(),
            });
        }
        Ok(y)
    }

    /// Converge the root connected to `guess`, starting from the energy `omega`.
    ///
    /// A guess shorter than the operator dimension is zero-padded; a longer one
    /// or one with zero norm is rejected. Exhausting `max_iterations` returns the
    /// last iterate with `converged == false`.
    pub fn solve(
        &self,
        guess: &DVector<f64>,
        omega: f64,
        observer: &mut dyn IterationObserver,
    ) -> Result<EigenSolution, SolverError> {
        let ndim = self.operator.dim();
        if self.preconditioner.dim() != ndim {
            return Err(SolverError::OperatorDimension {
                expected: ndim,
                found: self.preconditioner.dim(),
            });
        }
        let nrest = self.params.restart_depth.max(1);
        let max_size = self.params.max_subspace_size.max(nrest + 1);
        if max_size != self.params.max_subspace_size {
            debug!(
                "max_subspace_size raised from {} to {} to fit the restart block",
                self.params.max_subspace_size, max_size
            );
        }

        let r0 = pad_to(guess, ndim)?;
        let norm = r0.norm();
        if norm == 0.0 {
            return Err(SolverError::ZeroGuess);
        }
        let r0 = r0 / norm;

        let mut basis = DMatrix::<f64>::zeros(ndim, max_size);
        let mut sigma = DMatrix::<f64>::zeros(ndim, max_size);
        let mut projected = DMatrix::<f64>::zeros(max_size, max_size);
        let mut restart = DMatrix::<f64>::zeros(ndim, nrest);
        let mut restart_filled = 0;

        basis.set_column(0, &r0);
        sigma.set_column(0, &self.sigma(omega, &r0)?);
        extend_projection(&mut projected, &basis, &sigma, 0);
        let mut curr_size = 1;

        observer.on_start("Davidson", ndim, omega);

        let mut omega = omega;
        let mut r = r0;
        let mut residual_norm = f64::INFINITY;
        let mut delta_omega = f64::INFINITY;
        let mut converged = false;
        let mut iterations = 0;

        for niter in 0..self.params.max_iterations {
            let start = Instant::now();
            iterations = niter + 1;
            let omega_old = omega;

            let g = projected.view((0, 0), (curr_size, curr_size)).into_owned();
            let mut pairs = eigenpairs(&g)?;
            let idx = self
                .params
                .root_selection
                .select(&pairs, omega)
                .ok_or(SolverError::EigenDecomposition { size: curr_size })?;
            let (value, alpha) = pairs
                .swap_remove(idx)
                .into_real(self.params.imaginary_tolerance)?;
            omega = value;

            r = basis.columns(0, curr_size) * &alpha;
            restart.set_column(niter % nrest, &r);
            restart_filled = (restart_filled + 1).min(nrest);

            let residual = sigma.columns(0, curr_size) * &alpha - &r * omega;
            residual_norm = residual.norm();
            delta_omega = omega - omega_old;

            let mut record = IterationRecord {
                iteration: iterations,
                omega,
                delta_omega,
                residual_norm,
                subspace_size: curr_size,
                max_overlap: 0.0,
                wall_time: start.elapsed(),
            };

            if residual_norm < self.params.convergence_threshold
                && delta_omega.abs() < self.params.convergence_threshold
            {
                converged = true;
                observer.on_iteration(&record);
                break;
            }

            let mut q = self.preconditioner.precondition(&residual, omega);
            if self.params.olsen_correction {
                olsen_correct(&mut q, &r, omega, self.preconditioner);
            }
            let q_norm = orthogonalize(&mut q, &basis, curr_size);

            if q_norm < LINEAR_DEPENDENCE_TOL {
                debug!(
                    "Iteration {}: correction vector is linearly dependent (|q| = {:.3e}), basis not expanded",
                    iterations, q_norm
                );
            } else {
                q /= q_norm;
                record.max_overlap = (0..curr_size)
                    .map(|p| {
                        let b = basis.column(p);
                        b.dot(&q).abs() / b.norm()
                    })
                    .fold(0.0, f64::max);

                if curr_size < max_size {
                    basis.set_column(curr_size, &q);
                    sigma.set_column(curr_size, &self.sigma(omega, &q)?);
                    extend_projection(&mut projected, &basis, &sigma, curr_size);
                    curr_size += 1;
                } else {
                    let current = niter % nrest;
                    let mut block = DMatrix::<f64>::zeros(ndim, restart_filled);
                    block.set_column(0, &r);
                    let older = (0..restart_filled).filter(|&slot| slot != current);
                    for (col, slot) in (1..restart_filled).zip(older) {
                        block.set_column(col, &restart.column(slot));
                    }
                    let orthonormal = block.qr().q();
                    curr_size = orthonormal.ncols();
                    for j in 0..curr_size {
                        let v = orthonormal.column(j).into_owned();
                        sigma.set_column(j, &self.sigma(omega, &v)?);
                        basis.set_column(j, &v);
                    }

                    let q_norm = orthogonalize(&mut q, &basis, curr_size);
                    if q_norm >= LINEAR_DEPENDENCE_TOL {
                        q /= q_norm;
                        basis.set_column(curr_size, &q);
                        sigma.set_column(curr_size, &self.sigma(omega, &q)?);
                        curr_size += 1;
                    }
                    for j in 0..curr_size {
                        extend_projection(&mut projected, &basis, &sigma, j);
                    }
                    observer.on_restart(iterations, curr_size);
                }
            }

            record.subspace_size = curr_size;
            record.wall_time = start.elapsed();
            observer.on_iteration(&record);
        }

        if !converged {
            warn!(
                "Davidson iterations did not converge after {} iterations (|r| = {:.3e}, Δω = {:.3e})",
                iterations, residual_norm, delta_omega
            );
        }

        let solution = EigenSolution {
            omega,
            vector: r,
            residual_norm,
            delta_omega,
            iterations,
            converged,
        };
        observer.on_finish(&solution);
        Ok(solution)
    }
}

/// `q <- q - ε P r` with `ε = (r . q) / (r . P r)`, `P` being the preconditioner at `omega`.
fn olsen_correct<P>(q: &mut DVector<f64>, r: &DVector<f64>, omega: f64, preconditioner: &P)
where
    P: Preconditioner + ?Sized,
{
    let pr = preconditioner.precondition(r, omega);
    let denominator = r.dot(&pr);
    if denominator.abs() > f64::EPSILON * pr.norm() {
        let epsilon = r.dot(&*q) / denominator;
        q.axpy(-epsilon, &pr, 1.0);
    }
}

/// Remove from `q` its components along the first `size` basis columns, returning the remaining norm.
fn orthogonalize(q: &mut DVector<f64>, basis: &DMatrix<f64>, size: usize) -> f64 {
    for p in 0..size {
        let b = basis.column(p);
        let b_norm2 = b.norm_squared();
        if b_norm2 > 0.0 {
            let coefficient = b.dot(&*q) / b_norm2;
            q.axpy(-coefficient, &b, 1.0);
        }
    }
    q.norm()
}

/// Fill row and column `k` of the projected matrix, `G[p,k] = b_p . σ_k` and `G[k,p] = b_k . σ_p`.
fn extend_projection(projected: &mut DMatrix<f64>, basis: &DMatrix<f64>, sigma: &DMatrix<f64>, k: usize) {
    for p in 0..=k {
        projected[(k, p)] = basis.column(k).dot(&sigma.column(p));
        projected[(p, k)] = basis.column(p).dot(&sigma.column(k));
    }
}
