//! Per-iteration progress reporting for the iterative eigensolvers

use super::EigenSolution;
use std::time::Duration;
use tracing::{info, warn};

/// Snapshot of one solver iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    /// 1-based iteration number
    pub iteration: usize,
    pub omega: f64,
    pub delta_omega: f64,
    pub residual_norm: f64,
    /// Number of basis vectors after this iteration's expansion or restart
    pub subspace_size: usize,
    /// Largest `|b_j . q| / |b_j|` of the new correction against the current basis
    pub max_overlap: f64,
    pub wall_time: Duration,
}

/// Receives solver progress. Every method has an empty default.
pub trait IterationObserver {
    fn on_start(&mut self, _method: &str, _dim: usize, _omega: f64) {}

    fn on_iteration(&mut self, _record: &IterationRecord) {}

    /// Called when the subspace was full and has been collapsed to the restart block.
    fn on_restart(&mut self, _iteration: usize, _kept: usize) {}

    fn on_finish(&mut self, _solution: &EigenSolution) {}
}

/// Observer that ignores everything.
impl IterationObserver for () {}

/// Writes the iteration table through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IterationObserver for TracingObserver {
    fn on_start(&mut self, method: &str, dim: usize, omega: f64) {
        info!("===========================================");
        info!("     Starting {} Iterations", method);
        info!("===========================================");
        info!("Packed vector dimension: {}", dim);
        info!("Initial energy: {:.12} Eh", omega);
        info!("");
        info!(
            "{:>5} {:>18} {:>15} {:>15} {:>6} {:>10} {:>10}",
            "Iter", "ω", "Δω", "|r|", "Size", "Overlap", "Time(s)"
        );
        info!("{}", "-".repeat(85));
    }

    fn on_iteration(&mut self, record: &IterationRecord) {
        info!(
            "{:5} {:18.12} {:15.10} {:15.10} {:6} {:10.6} {:10.3}",
            record.iteration,
            record.omega,
            record.delta_omega,
            record.residual_norm,
            record.subspace_size,
            record.max_overlap,
            record.wall_time.as_secs_f64()
        );
    }

    fn on_restart(&mut self, iteration: usize, kept: usize) {
        info!(
            "      Subspace restart at iteration {} ({} vectors kept)",
            iteration, kept
        );
    }

    fn on_finish(&mut self, solution: &EigenSolution) {
        info!("");
        info!("===========================================");
        if solution.converged {
            info!("       Root Converged!");
        } else {
            warn!("       Root NOT Converged");
        }
        info!("===========================================");
        info!("Excitation energy: {:.12} Eh", solution.omega);
        info!("Number of iterations: {}", solution.iterations);
        info!("Final residual norm: {:.3e}", solution.residual_norm);
        info!("Final energy change: {:.3e} Eh", solution.delta_omega);
        info!("===========================================");
    }
}

/// Collects every record, for callers that post-process convergence.
#[derive(Debug, Default, Clone)]
pub struct HistoryObserver {
    pub records: Vec<IterationRecord>,
    pub restarts: Vec<usize>,
}

impl IterationObserver for HistoryObserver {
    fn on_iteration(&mut self, record: &IterationRecord) {
        self.records.push(record.clone());
    }

    fn on_restart(&mut self, iteration: usize, _kept: usize) {
        self.restarts.push(iteration);
    }
}
