//! Dense non-symmetric eigen-decomposition of small projected matrices
//!
//! The Davidson subspace matrix `G = B^T H B` is small but not symmetric, so its
//! eigenvalues may come in complex-conjugate pairs. Eigenvalues are read off a
//! real Schur form; each eigenvector is the right singular vector of `G - λI`
//! with the smallest singular value.

use crate::error::SolverError;
use nalgebra::{DMatrix, DVector, Schur};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Relative distance under which two eigenvalues are treated as one degenerate level.
const DEGENERACY_TOL: f64 = 1e-10;

/// One eigenvalue of a projected matrix with its unit right eigenvector.
#[derive(Debug, Clone)]
pub struct SubspaceEigenpair {
    pub value: Complex64,
    pub vector: DVector<Complex64>,
}

impl SubspaceEigenpair {
    /// Convert to a real eigenpair.
    ///
    /// Fails with [`SolverError::ComplexRoot`] when the imaginary part of the
    /// eigenvalue exceeds `tolerance`. Otherwise the vector is rotated so that its
    /// largest component is real and positive, and its real part is returned with
    /// unit norm.
    pub fn into_real(self, tolerance: f64) -> Result<(f64, DVector<f64>), SolverError> {
        if self.value.im.abs() > tolerance {
            return Err(SolverError::ComplexRoot {
                real: self.value.re,
                imag: self.value.im,
                tolerance,
            });
        }
        let pivot = self
            .vector
            .iter()
            .copied()
            .max_by(|a, b| a.norm().total_cmp(&b.norm()))
            .unwrap_or(Complex64::new(1.0, 0.0));
        let phase = if pivot.norm() > 0.0 {
            pivot.conj() / pivot.norm()
        } else {
            Complex64::new(1.0, 0.0)
        };
        let mut real = self.vector.map(|z| (z * phase).re);
        let norm = real.norm();
        if norm > 0.0 {
            real /= norm;
        }
        Ok((self.value.re, real))
    }
}

/// Eigenvalues of a real square matrix, in the order produced by the Schur form.
pub fn eigenvalues(g: &DMatrix<f64>) -> Result<Vec<Complex64>, SolverError> {
    let n = g.nrows();
    if n == 0 {
        return Ok(Vec::new());
    }
    let schur = Schur::try_new(g.clone(), f64::EPSILON, 0)
        .ok_or(SolverError::EigenDecomposition { size: n })?;
    Ok(schur.complex_eigenvalues().iter().copied().collect())
}

/// The `count` right singular vectors of `g - value*I` with the smallest singular values.
pub fn null_space(
    g: &DMatrix<f64>,
    value: Complex64,
    count: usize,
) -> Result<Vec<DVector<Complex64>>, SolverError> {
    let n = g.nrows();
    let shifted = DMatrix::from_fn(n, n, |r, c| {
        let z = Complex64::new(g[(r, c)], 0.0);
        if r == c {
            z - value
        } else {
            z
        }
    });
    let svd = shifted.svd(false, true);
    let Some(v_t) = svd.v_t else {
        return Err(SolverError::EigenDecomposition { size: n });
    };
    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&a, &b| svd.singular_values[a].total_cmp(&svd.singular_values[b]));
    Ok(order
        .into_iter()
        .take(count)
        .map(|k| {
            let v = v_t.row(k).adjoint();
            let norm = v.norm();
            if norm > 0.0 {
                v.map(|z| z / norm)
            } else {
                v
            }
        })
        .collect())
}

/// All eigenpairs of a real square matrix.
///
/// Degenerate eigenvalues receive distinct vectors from the same null space.
pub fn eigenpairs(g: &DMatrix<f64>) -> Result<Vec<SubspaceEigenpair>, SolverError> {
    let values = eigenvalues(g)?;
    let mut pairs = Vec::with_capacity(values.len());
    for (k, &value) in values.iter().enumerate() {
        let scale = value.norm().max(1.0);
        let rank = values[..k]
            .iter()
            .filter(|&&other| (other - value).norm() < DEGENERACY_TOL * scale)
            .count();
        let mut vectors = null_space(g, value, rank + 1)?;
        let vector = vectors
            .pop()
            .ok_or(SolverError::EigenDecomposition { size: g.nrows() })?;
        pairs.push(SubspaceEigenpair { value, vector });
    }
    Ok(pairs)
}

/// Rule for picking which subspace eigenpair to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootSelection {
    /// Largest magnitude of the component along the first basis vector.
    #[default]
    #[serde(alias = "overlap")]
    MaxOverlap,
    /// Eigenvalue closest to the current estimate.
    #[serde(alias = "energy")]
    ClosestEnergy,
}

impl FromStr for RootSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overlap" | "maxoverlap" | "max_overlap" => Ok(RootSelection::MaxOverlap),
            "energy" | "closestenergy" | "closest_energy" => Ok(RootSelection::ClosestEnergy),
            _ => Err(format!("Unknown root selection rule: {}", s)),
        }
    }
}

impl RootSelection {
    /// Index of the selected pair, or `None` for an empty slice.
    ///
    /// Ties keep the last candidate in order.
    pub fn select(&self, pairs: &[SubspaceEigenpair], omega: f64) -> Option<usize> {
        let score = |pair: &SubspaceEigenpair| -> f64 {
            match self {
                RootSelection::MaxOverlap => pair.vector.get(0).map_or(0.0, |z| z.norm()),
                RootSelection::ClosestEnergy => -(pair.value - omega).norm(),
            }
        };
        let mut best: Option<(usize, f64)> = None;
        for (idx, pair) in pairs.iter().enumerate() {
            let s = score(pair);
            match best {
                Some((_, top)) if s < top => {}
                _ => best = Some((idx, s)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}
