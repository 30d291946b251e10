//! Streaming triples denominators
//!
//! Pieces that depend only on unoccupied or only on occupied indices are
//! precomputed once as small arrays. For each occupied triple, [`OccupiedTriple`]
//! gathers the per-`ijk` scalars and per-orbital sums so that the four
//! denominators of an `abc` entry cost O(1) each (O(no) for `D`).

use super::CorrectionLabel;
use crate::hamiltonian::Hamiltonian;
use ndarray::{Array2, Array3, ArrayView2, ArrayView4};

/// Three-body Hbar diagonal contributions `(d3v, d3o)`.
///
/// * `d3v[a,i,b] = -sum_m h_oovv[i,m,a,b] t2[a,b,i,m]`
/// * `d3o[a,i,j] =  sum_e h_oovv[i,j,a,e] t2[a,e,i,j]`
pub fn three_body_diagonal(oovv: ArrayView4<f64>, t2: ArrayView4<f64>) -> (Array3<f64>, Array3<f64>) {
    let (nu, no) = (t2.shape()[0], t2.shape()[2]);
    let d3v = Array3::from_shape_fn((nu, no, nu), |(a, i, b)| {
        -(0..no)
            .map(|m| oovv[[i, m, a, b]] * t2[[a, b, i, m]])
            .sum::<f64>()
    });
    let d3o = Array3::from_shape_fn((nu, no, no), |(a, i, j)| {
        (0..nu)
            .map(|e| oovv[[i, j, a, e]] * t2[[a, e, i, j]])
            .sum::<f64>()
    });
    (d3v, d3o)
}

/// Precomputed, occupied-triple independent denominator pieces.
#[derive(Debug, Clone)]
pub struct TriplesDenominators {
    omega: f64,
    fock_occ: Vec<f64>,
    fock_unocc: Vec<f64>,
    hbar_occ: Vec<f64>,
    hbar_unocc: Vec<f64>,
    /// `h_voov[a,m,m,a]` indexed `[a,m]`
    voov: Array2<f64>,
    /// `h_oooo[j,i,j,i]` indexed `[i,j]`
    oooo: Array2<f64>,
    /// `h_vvvv[b,a,b,a]` indexed `[a,b]`
    vvvv: Array2<f64>,
    /// `(d3v, d3o)`, only built when `D` is requested
    three_body: Option<(Array3<f64>, Array3<f64>)>,
}

impl TriplesDenominators {
    /// # Arguments
    ///
    /// * `fock` - Bare Fock matrix over all orbitals (for `A`)
    /// * `hbar` - Similarity-transformed Hamiltonian (for `B`, `C`, `D`)
    /// * `t2` - Doubles amplitudes `t2[a,b,i,j]`
    /// * `omega` - Excitation energy, `0.0` for the ground state
    /// * `labels` - Requested corrections; the three-body pieces are built only for `D`
    pub fn new(
        fock: ArrayView2<f64>,
        hbar: &Hamiltonian,
        t2: ArrayView4<f64>,
        omega: f64,
        labels: &[CorrectionLabel],
    ) -> Self {
        let no = hbar.no;
        let nu = hbar.nu();
        let fock_diag = fock.diag();
        let three_body = labels
            .contains(&CorrectionLabel::D)
            .then(|| three_body_diagonal(hbar.oovv(), t2));
        let voov = hbar.voov();
        let oooo = hbar.oooo();
        let vvvv = hbar.vvvv();
        TriplesDenominators {
            omega,
            fock_occ: (0..no).map(|i| fock_diag[i]).collect(),
            fock_unocc: (0..nu).map(|a| fock_diag[no + a]).collect(),
            hbar_occ: hbar.eps_occ(),
            hbar_unocc: hbar.eps_unocc(),
            voov: Array2::from_shape_fn((nu, no), |(a, m)| voov[[a, m, m, a]]),
            oooo: Array2::from_shape_fn((no, no), |(i, j)| oooo[[j, i, j, i]]),
            vvvv: Array2::from_shape_fn((nu, nu), |(a, b)| vvvv[[b, a, b, a]]),
            three_body,
        }
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Whether the `D` denominator can be evaluated.
    pub fn has_three_body(&self) -> bool {
        self.three_body.is_some()
    }

    /// Gather the pieces that depend on the occupied triple `i<j<k`.
    pub fn for_triple(&self, i: usize, j: usize, k: usize) -> OccupiedTriple<'_> {
        let nu = self.fock_unocc.len();
        let occ = [i, j, k];
        let voov_x: Vec<f64> = (0..nu)
            .map(|x| occ.iter().map(|&m| self.voov[[x, m]]).sum::<f64>())
            .collect();
        let d3o_x: Vec<f64> = match &self.three_body {
            Some((_, d3o)) => (0..nu)
                .map(|x| d3o[[x, i, j]] + d3o[[x, i, k]] + d3o[[x, j, k]])
                .collect(),
            None => Vec::new(),
        };
        OccupiedTriple {
            parent: self,
            occ,
            a_ijk: self.omega + occ.iter().map(|&m| self.fock_occ[m]).sum::<f64>(),
            b_ijk: self.omega + occ.iter().map(|&m| self.hbar_occ[m]).sum::<f64>(),
            oooo_ijk: self.oooo[[i, j]] + self.oooo[[i, k]] + self.oooo[[j, k]],
            voov_x,
            d3o_x,
        }
    }
}

/// Denominator pieces for one occupied triple.
#[derive(Debug, Clone)]
pub struct OccupiedTriple<'a> {
    parent: &'a TriplesDenominators,
    occ: [usize; 3],
    a_ijk: f64,
    b_ijk: f64,
    oooo_ijk: f64,
    voov_x: Vec<f64>,
    d3o_x: Vec<f64>,
}

impl OccupiedTriple<'_> {
    /// Denominators `[A, B, C, D]` of the entry `abc`.
    ///
    /// `C` and `D` are left at zero unless requested; `need_d` implies `need_c`.
    /// `D` is NaN when the three-body pieces were not built.
    pub fn values(&self, a: usize, b: usize, c: usize, need_c: bool, need_d: bool) -> [f64; 4] {
        let p = self.parent;
        let abc = [a, b, c];
        let den_a = self.a_ijk - abc.iter().map(|&x| p.fock_unocc[x]).sum::<f64>();
        let den_b = self.b_ijk - abc.iter().map(|&x| p.hbar_unocc[x]).sum::<f64>();
        if !(need_c || need_d) {
            return [den_a, den_b, 0.0, 0.0];
        }
        let den_c = den_b
            - abc.iter().map(|&x| self.voov_x[x]).sum::<f64>()
            - self.oooo_ijk
            - (p.vvvv[[a, b]] + p.vvvv[[a, c]] + p.vvvv[[b, c]]);
        if !need_d {
            return [den_a, den_b, den_c, 0.0];
        }
        let Some((d3v, _)) = &p.three_body else {
            return [den_a, den_b, den_c, f64::NAN];
        };
        let d3v_sum: f64 = self
            .occ
            .iter()
            .map(|&m| d3v[[a, m, b]] + d3v[[a, m, c]] + d3v[[b, m, c]])
            .sum();
        let den_d = den_c + abc.iter().map(|&x| self.d3o_x[x]).sum::<f64>() - d3v_sum;
        [den_a, den_b, den_c, den_d]
    }
}
