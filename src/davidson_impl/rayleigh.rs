//! Preconditioned Rayleigh-quotient fixed-point iteration
//!
//! A single-vector alternative to Davidson for energy-dependent operators:
//! `σ = H(ω) R`, `ω = σ.R / R.R`, then `R <- R + precondition(residual)`
//! renormalized to unit length.

use super::observer::{IterationObserver, IterationRecord};
use super::EigenSolution;
use crate::error::SolverError;
use crate::operator::SigmaOperator;
use crate::precond_impl::Preconditioner;
use crate::tensor::pad_to;
use nalgebra::DVector;
use std::time::Instant;
use tracing::warn;

/// Iteration controls of the Rayleigh-quotient solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayleighParams {
    pub max_iterations: usize,
    pub convergence_threshold: f64,
    /// Energy passed to the preconditioner in place of the current `ω`
    pub shift: f64,
}

impl Default for RayleighParams {
    fn default() -> Self {
        RayleighParams {
            max_iterations: 80,
            convergence_threshold: 1e-7,
            shift: 0.0,
        }
    }
}

pub struct RayleighQuotientSolver<'a, O: ?Sized, P: ?Sized> {
    operator: &'a O,
    preconditioner: &'a P,
    params: RayleighParams,
}

impl<'a, O, P> RayleighQuotientSolver<'a, O, P>
where
    O: SigmaOperator + ?Sized,
    P: Preconditioner + ?Sized,
{
    pub fn new(operator: &'a O, preconditioner: &'a P, params: RayleighParams) -> Self {
        RayleighQuotientSolver {
            operator,
            preconditioner,
            params,
        }
    }

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
        let mut r = pad_to(guess, ndim)?;
        let norm = r.norm();
        if norm == 0.0 {
            return Err(SolverError::ZeroGuess);
        }
        r /= norm;

        observer.on_start("Rayleigh-quotient", ndim, omega);

        let mut omega = omega;
        let mut residual_norm = f64::INFINITY;
        let mut delta_omega = f64::INFINITY;
        let mut converged = false;
        let mut iterations = 0;

        for niter in 0..self.params.max_iterations {
            let start = Instant::now();
            iterations = niter + 1;
            let omega_old = omega;

            let sigma = self.operator.apply(omega, &r)?;
            if sigma.len() != ndim {
                return Err(SolverError::OperatorDimension {
                    expected: ndim,
                    found: sigma.len(),
                });
            }
            omega = sigma.dot(&r) / r.dot(&r);
            let residual = (&sigma - &r * omega) / r.norm();
            residual_norm = residual.norm();
            delta_omega = omega - omega_old;

            observer.on_iteration(&IterationRecord {
                iteration: iterations,
                omega,
                delta_omega,
                residual_norm,
                subspace_size: 1,
                max_overlap: 0.0,
                wall_time: start.elapsed(),
            });

            if residual_norm < self.params.convergence_threshold
                && delta_omega.abs() < self.params.convergence_threshold
            {
                converged = true;
                break;
            }

            let update = self.preconditioner.precondition(&residual, self.params.shift);
            r += update;
            let norm = r.norm();
            if norm == 0.0 {
                return Err(SolverError::ZeroGuess);
            }
            r /= norm;
        }

        if !converged {
            warn!(
                "Rayleigh-quotient iterations did not converge after {} iterations (|r| = {:.3e}, Δω = {:.3e})",
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
