//! Operator-action providers for the iterative eigensolvers
//!
//! The solvers never see the Hamiltonian directly. They only need
//! `x -> H(ω) x` on packed vectors, supplied through [`SigmaOperator`].

use crate::error::SolverError;
use crate::hamiltonian::Hamiltonian;
use crate::tensor::PackedLayout;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayView2};

/// Action of a (possibly energy-dependent) non-Hermitian operator on packed vectors.
pub trait SigmaOperator {
    /// Length of the packed vectors the operator acts on.
    fn dim(&self) -> usize;

    /// Compute `H(omega) x`.
    ///
    /// Operators that do not depend on the energy ignore `omega`.
    fn apply(&self, omega: f64, x: &DVector<f64>) -> Result<DVector<f64>, SolverError>;
}

impl<T: SigmaOperator + ?Sized> SigmaOperator for &T {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn apply(&self, omega: f64, x: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        (**self).apply(omega, x)
    }
}

fn check_input(expected: usize, x: &DVector<f64>) -> Result<(), SolverError> {
    if x.len() != expected {
        return Err(SolverError::DimensionMismatch {
            expected,
            found: x.len(),
        });
    }
    Ok(())
}

/// Explicit dense matrix, mostly for small systems and checks.
#[derive(Debug, Clone)]
pub struct DenseOperator {
    matrix: DMatrix<f64>,
}

impl DenseOperator {
    pub fn new(matrix: DMatrix<f64>) -> Self {
        DenseOperator { matrix }
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

impl SigmaOperator for DenseOperator {
    fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    fn apply(&self, _omega: f64, x: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        check_input(self.dim(), x)?;
        Ok(&self.matrix * x)
    }
}

/// Closure-backed operator, e.g. for energy-dependent partitioned Hamiltonians.
pub struct FnOperator<F>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    dim: usize,
    action: F,
}

impl<F> FnOperator<F>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    pub fn new(dim: usize, action: F) -> Self {
        FnOperator { dim, action }
    }
}

impl<F> SigmaOperator for FnOperator<F>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn apply(&self, omega: f64, x: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        check_input(self.dim, x)?;
        Ok((self.action)(omega, x))
    }
}

/// Singles-singles block of the similarity-transformed Hamiltonian.
///
/// `X[a,i] = sum_e h_vv[a,e] r[e,i] - sum_m h_oo[m,i] r[a,m] + sum_me h_voov[a,m,i,e] r[e,m]`
pub struct CisOperator<'a> {
    hamiltonian: &'a Hamiltonian,
    layout: PackedLayout,
}

impl<'a> CisOperator<'a> {
    pub fn new(hamiltonian: &'a Hamiltonian) -> Self {
        let layout = PackedLayout::ee_singles(hamiltonian.no, hamiltonian.nu());
        CisOperator {
            hamiltonian,
            layout,
        }
    }

    pub fn layout(&self) -> &PackedLayout {
        &self.layout
    }

    fn sigma(&self, r1: ArrayView2<f64>) -> Array2<f64> {
        let h = self.hamiltonian;
        let mut x = h.vv().dot(&r1) - r1.dot(&h.oo());
        let voov = h.voov();
        for ((a, i), value) in x.indexed_iter_mut() {
            for ((e, m), &r) in r1.indexed_iter() {
                *value += voov[[a, m, i, e]] * r;
            }
        }
        x
    }

    /// Dense `A[ai,bj]` built column by column from the operator action.
    pub fn dense_matrix(&self) -> Result<DMatrix<f64>, SolverError> {
        let n = self.dim();
        let mut matrix = DMatrix::zeros(n, n);
        for col in 0..n {
            let mut unit = DVector::zeros(n);
            unit[col] = 1.0;
            matrix.set_column(col, &self.apply(0.0, &unit)?);
        }
        Ok(matrix)
    }
}

impl SigmaOperator for CisOperator<'_> {
    fn dim(&self) -> usize {
        self.layout.ndim()
    }

    fn apply(&self, _omega: f64, x: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        let blocks = self.layout.split(x.as_slice())?;
        let r1 = blocks[0]
            .view()
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|_| SolverError::DimensionMismatch {
                expected: self.dim(),
                found: x.len(),
            })?;
        let sigma = self.sigma(r1);
        Ok(DVector::from_iterator(sigma.len(), sigma.iter().copied()))
    }
}
