//! Similarity-transformed Hamiltonian in a spin-orbital basis
//!
//! Orbitals are ordered with the `no` occupied spin orbitals first, followed by
//! the `nu` unoccupied ones. One- and two-body parts are stored as full dense
//! tensors; the block accessors return views such as `h_ov[m,e]` or
//! `h_voov[a,m,i,e]` without copying.

use crate::error::SolverError;
use crate::tensor::Space;
use ndarray::{s, Array2, Array4, ArrayView2, ArrayView4};
use std::ops::Range;

/// One- and two-body parts of a (similarity-transformed) Hamiltonian.
#[derive(Debug, Clone)]
pub struct Hamiltonian {
    /// One-body part, `norb x norb`
    pub h1: Array2<f64>,

    /// Antisymmetrized two-body part `<pq||rs>`, `norb^4`
    pub h2: Array4<f64>,

    /// Number of occupied spin orbitals
    pub no: usize,
}

impl Hamiltonian {
    /// Wrap dense one- and two-body arrays.
    ///
    /// # Arguments
    ///
    /// * `h1` - One-body part, square
    /// * `h2` - Two-body part with all four dimensions equal to `h1.nrows()`
    /// * `no` - Number of occupied spin orbitals
    pub fn new(h1: Array2<f64>, h2: Array4<f64>, no: usize) -> Result<Self, SolverError> {
        let norb = h1.nrows();
        if h1.ncols() != norb {
            return Err(SolverError::DimensionMismatch {
                expected: norb,
                found: h1.ncols(),
            });
        }
        if let Some(&bad) = h2.shape().iter().find(|&&d| d != norb) {
            return Err(SolverError::DimensionMismatch {
                expected: norb,
                found: bad,
            });
        }
        if no > norb {
            return Err(SolverError::DimensionMismatch {
                expected: norb,
                found: no,
            });
        }
        Ok(Hamiltonian { h1, h2, no })
    }

    pub fn norb(&self) -> usize {
        self.h1.nrows()
    }

    pub fn nu(&self) -> usize {
        self.norb() - self.no
    }

    fn range(&self, space: Space) -> Range<usize> {
        match space {
            Space::Occupied => 0..self.no,
            Space::Unoccupied => self.no..self.norb(),
        }
    }

    /// One-body block for the given pair of spaces.
    pub fn one_body(&self, p: Space, q: Space) -> ArrayView2<'_, f64> {
        self.h1.slice(s![self.range(p), self.range(q)])
    }

    /// Two-body block for the given quadruple of spaces.
    pub fn two_body(&self, spaces: [Space; 4]) -> ArrayView4<'_, f64> {
        let [p, q, r, t] = spaces;
        self.h2.slice(s![
            self.range(p),
            self.range(q),
            self.range(r),
            self.range(t)
        ])
    }

    pub fn oo(&self) -> ArrayView2<'_, f64> {
        self.one_body(Space::Occupied, Space::Occupied)
    }

    pub fn ov(&self) -> ArrayView2<'_, f64> {
        self.one_body(Space::Occupied, Space::Unoccupied)
    }

    pub fn vv(&self) -> ArrayView2<'_, f64> {
        self.one_body(Space::Unoccupied, Space::Unoccupied)
    }

    pub fn oooo(&self) -> ArrayView4<'_, f64> {
        use Space::*;
        self.two_body([Occupied, Occupied, Occupied, Occupied])
    }

    pub fn ooov(&self) -> ArrayView4<'_, f64> {
        use Space::*;
        self.two_body([Occupied, Occupied, Occupied, Unoccupied])
    }

    pub fn oovv(&self) -> ArrayView4<'_, f64> {
        use Space::*;
        self.two_body([Occupied, Occupied, Unoccupied, Unoccupied])
    }

    pub fn voov(&self) -> ArrayView4<'_, f64> {
        use Space::*;
        self.two_body([Unoccupied, Occupied, Occupied, Unoccupied])
    }

    pub fn vooo(&self) -> ArrayView4<'_, f64> {
        use Space::*;
        self.two_body([Unoccupied, Occupied, Occupied, Occupied])
    }

    pub fn vovv(&self) -> ArrayView4<'_, f64> {
        use Space::*;
        self.two_body([Unoccupied, Occupied, Unoccupied, Unoccupied])
    }

    pub fn vvov(&self) -> ArrayView4<'_, f64> {
        use Space::*;
        self.two_body([Unoccupied, Unoccupied, Occupied, Unoccupied])
    }

    pub fn vvvv(&self) -> ArrayView4<'_, f64> {
        use Space::*;
        self.two_body([Unoccupied, Unoccupied, Unoccupied, Unoccupied])
    }

    /// Diagonal of the occupied one-body block.
    pub fn eps_occ(&self) -> Vec<f64> {
        self.oo().diag().to_vec()
    }

    /// Diagonal of the unoccupied one-body block.
    pub fn eps_unocc(&self) -> Vec<f64> {
        self.vv().diag().to_vec()
    }
}
