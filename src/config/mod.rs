//! Configuration for EOM root calculations
//!
//! Every section of the YAML file is optional; `with_defaults` fills in what is
//! missing so that the driver can read plain values.

mod args;

pub use args::Args;

use crate::davidson_impl::DavidsonParams;
use crate::eigen::RootSelection;
use serde::{Deserialize, Serialize};

/// Top-level configuration file
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Path of the FCIDUMP integral file
    pub fcidump: Option<String>,
    /// Override of the electron count in the FCIDUMP header
    pub nelec: Option<usize>,
    pub davidson: Option<DavidsonSection>,
    pub guess: Option<GuessSection>,
    /// Indices into the energy-sorted CIS guesses to converge
    pub roots: Option<Vec<usize>>,
}

/// Davidson solver parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DavidsonSection {
    pub max_iterations: Option<usize>,
    pub convergence_threshold: Option<f64>,
    pub max_subspace_size: Option<usize>,
    pub restart_depth: Option<usize>,
    pub root_selection: Option<RootSelection>,
    pub imaginary_tolerance: Option<f64>,
    pub olsen_correction: Option<bool>,
}

impl Default for DavidsonSection {
    fn default() -> Self {
        let params = DavidsonParams::default();
        DavidsonSection {
            max_iterations: Some(params.max_iterations),
            convergence_threshold: Some(params.convergence_threshold),
            max_subspace_size: Some(params.max_subspace_size),
            restart_depth: Some(params.restart_depth),
            root_selection: Some(params.root_selection),
            imaginary_tolerance: Some(params.imaginary_tolerance),
            olsen_correction: Some(params.olsen_correction),
        }
    }
}

impl DavidsonSection {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.max_iterations.is_none() {
            self.max_iterations = defaults.max_iterations;
        }
        if self.convergence_threshold.is_none() {
            self.convergence_threshold = defaults.convergence_threshold;
        }
        if self.max_subspace_size.is_none() {
            self.max_subspace_size = defaults.max_subspace_size;
        }
        if self.restart_depth.is_none() {
            self.restart_depth = defaults.restart_depth;
        }
        if self.root_selection.is_none() {
            self.root_selection = defaults.root_selection;
        }
        if self.imaginary_tolerance.is_none() {
            self.imaginary_tolerance = defaults.imaginary_tolerance;
        }
        if self.olsen_correction.is_none() {
            self.olsen_correction = defaults.olsen_correction;
        }
        self
    }
}

/// Initial guess parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GuessSection {
    pub num_roots: Option<usize>,
}

impl Default for GuessSection {
    fn default() -> Self {
        GuessSection { num_roots: Some(5) }
    }
}

impl GuessSection {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.num_roots.is_none() {
            self.num_roots = Self::default().num_roots;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.davidson = Some(self.davidson.take().unwrap_or_default().with_defaults());
        self.guess = Some(self.guess.take().unwrap_or_default().with_defaults());
        if self.roots.is_none() {
            self.roots = Some(vec![0]);
        }
        self
    }

    /// Solver parameters with command-line overrides applied
    pub fn davidson_params(&self, args: &Args) -> DavidsonParams {
        let defaults = DavidsonParams::default();
        let section = self.davidson.clone().unwrap_or_default().with_defaults();
        DavidsonParams {
            max_iterations: args
                .max_iterations
                .or(section.max_iterations)
                .unwrap_or(defaults.max_iterations),
            convergence_threshold: args
                .convergence_threshold
                .or(section.convergence_threshold)
                .unwrap_or(defaults.convergence_threshold),
            max_subspace_size: args
                .max_subspace_size
                .or(section.max_subspace_size)
                .unwrap_or(defaults.max_subspace_size),
            restart_depth: args
                .restart_depth
                .or(section.restart_depth)
                .unwrap_or(defaults.restart_depth),
            root_selection: section.root_selection.unwrap_or(defaults.root_selection),
            imaginary_tolerance: section
                .imaginary_tolerance
                .unwrap_or(defaults.imaginary_tolerance),
            olsen_correction: section.olsen_correction.unwrap_or(defaults.olsen_correction),
        }
    }

    /// Number of CIS guesses to generate
    pub fn num_guesses(&self) -> usize {
        self.guess.as_ref().and_then(|g| g.num_roots).unwrap_or(5)
    }

    /// Requested root indices
    pub fn roots(&self) -> Vec<usize> {
        self.roots.clone().unwrap_or_else(|| vec![0])
    }
}
