//! Completely renormalized triples corrections, CR-CC(2,3) and CR-EOMCC(2,3)
//!
//! # Overview
//!
//! Given converged doubles-level amplitudes, the correction is
//!
//! δ = Σ_{i<j<k} Σ_{a<b<c} L3(abc,ijk) M3(abc,ijk) / D(abc,ijk)
//!
//! where `M3` is the triples moment of the CC (or EOM-CC) equations and `L3`
//! the left triples amplitude built from the doubles-level left state. Four
//! denominators of increasing sophistication are available:
//!
//! * `A` - bare Fock diagonal
//! * `B` - Hbar one-body diagonal
//! * `C` - `B` plus two-body Hbar diagonal terms
//! * `D` - `C` plus three-body Hbar diagonal terms
//!
//! Occupied triples are streamed: only one `nu^3` block of `M3` and `L3` exists
//! per worker at any time.
//!
//! # Usage
//!
//! ```rust,ignore
//! use eomcc::{CorrectionLabel, TriplesOptions, CRCC23};
//!
//! let crcc = CRCC23::new(fock.view(), &hbar, t2.view(), l1.view(), l2.view());
//! let delta = crcc.compute(&TriplesOptions::default());
//! let e_crcc23_d = e_ccsd + delta.get(CorrectionLabel::D).unwrap_or(0.0);
//! ```

mod crcc23;
mod creomcc23;
mod denominators;
mod moments;

pub use crcc23::CRCC23;
pub use creomcc23::CREOMCC23;
pub use denominators::{three_body_diagonal, OccupiedTriple, TriplesDenominators};
pub use moments::{left_ijk, moments_ijk, MomentTerm};

use itertools::Itertools;
use ndarray::Array3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Denominator variant of a triples correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CorrectionLabel {
    A,
    B,
    C,
    D,
}

impl CorrectionLabel {
    pub const ALL: [CorrectionLabel; 4] = [
        CorrectionLabel::A,
        CorrectionLabel::B,
        CorrectionLabel::C,
        CorrectionLabel::D,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CorrectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CorrectionLabel::A => "A",
            CorrectionLabel::B => "B",
            CorrectionLabel::C => "C",
            CorrectionLabel::D => "D",
        };
        write!(f, "{}", name)
    }
}

/// How the occupied triples are distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionMode {
    Sequential,
    /// Occupied triples in parallel on the rayon pool, partial sums reduced at the end
    #[default]
    Parallel,
}

/// Controls for a triples-correction evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriplesOptions {
    /// Labels to evaluate; the others are skipped entirely
    pub labels: Vec<CorrectionLabel>,
    pub execution: ExecutionMode,
    /// Denominators with a magnitude below this are counted as near-singular
    pub small_denominator: f64,
}

impl Default for TriplesOptions {
    fn default() -> Self {
        TriplesOptions {
            labels: CorrectionLabel::ALL.to_vec(),
            execution: ExecutionMode::Parallel,
            small_denominator: 1e-8,
        }
    }
}

/// Triples corrections keyed by denominator label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriplesCorrection {
    pub values: BTreeMap<CorrectionLabel, f64>,
    /// Number of `(abc,ijk)` entries whose denominator fell below the threshold
    pub near_singular: BTreeMap<CorrectionLabel, usize>,
    /// Number of occupied triples visited
    pub occupied_triples: usize,
}

impl TriplesCorrection {
    pub fn get(&self, label: CorrectionLabel) -> Option<f64> {
        self.values.get(&label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CorrectionLabel, f64)> + '_ {
        self.values.iter().map(|(&label, &value)| (label, value))
    }
}

/// Running sums for one worker.
#[derive(Debug, Clone, Copy, Default)]
struct PartialSums {
    sums: [f64; 4],
    near_singular: [usize; 4],
}

impl PartialSums {
    fn merge(mut self, other: PartialSums) -> PartialSums {
        for n in 0..4 {
            self.sums[n] += other.sums[n];
            self.near_singular[n] += other.near_singular[n];
        }
        self
    }
}

/// Stream over `i<j<k`, contract `LM = L3*M3` with every requested denominator over `a<b<c`.
pub(crate) fn accumulate<F>(
    no: usize,
    nu: usize,
    denominators: &TriplesDenominators,
    options: &TriplesOptions,
    lm_ijk: F,
) -> TriplesCorrection
where
    F: Fn(usize, usize, usize) -> Array3<f64> + Sync,
{
    let mut wanted = [false; 4];
    for label in &options.labels {
        wanted[label.index()] = true;
    }
    if wanted[CorrectionLabel::D.index()] && !denominators.has_three_body() {
        warn!("Correction D skipped: three-body denominator pieces were not built");
        wanted[CorrectionLabel::D.index()] = false;
    }
    let need_c = wanted[CorrectionLabel::C.index()] || wanted[CorrectionLabel::D.index()];
    let need_d = wanted[CorrectionLabel::D.index()];
    let threshold = options.small_denominator;

    let triples: Vec<(usize, usize, usize)> = (0..no).tuple_combinations().collect();

    let per_triple = |&(i, j, k): &(usize, usize, usize)| -> PartialSums {
        let lm = lm_ijk(i, j, k);
        let occupied = denominators.for_triple(i, j, k);
        let mut partial = PartialSums::default();
        for (a, b, c) in (0..nu).tuple_combinations() {
            let x = lm[[a, b, c]];
            let values = occupied.values(a, b, c, need_c, need_d);
            for n in 0..4 {
                if !wanted[n] {
                    continue;
                }
                if values[n].abs() < threshold {
                    partial.near_singular[n] += 1;
                }
                partial.sums[n] += x / values[n];
            }
        }
        partial
    };

    let total = match options.execution {
        ExecutionMode::Parallel => triples
            .par_iter()
            .map(per_triple)
            .reduce(PartialSums::default, PartialSums::merge),
        ExecutionMode::Sequential => triples
            .iter()
            .map(per_triple)
            .fold(PartialSums::default(), PartialSums::merge),
    };

    let mut correction = TriplesCorrection {
        occupied_triples: triples.len(),
        ..TriplesCorrection::default()
    };
    for label in CorrectionLabel::ALL {
        let n = label.index();
        if !wanted[n] {
            continue;
        }
        correction.values.insert(label, total.sums[n]);
        correction.near_singular.insert(label, total.near_singular[n]);
        if total.near_singular[n] > 0 {
            warn!(
                "Correction {}: {} denominators below {:.1e}",
                label, total.near_singular[n], threshold
            );
        }
    }
    correction
}

fn log_corrections(title: &str, correction: &TriplesCorrection) {
    info!("===========================================");
    info!("     {}", title);
    info!("===========================================");
    info!("Occupied triples processed: {}", correction.occupied_triples);
    for (label, value) in correction.iter() {
        info!("Correction {}: {:.12} Eh", label, value);
    }
    info!("===========================================");
}
