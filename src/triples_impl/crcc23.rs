//! Ground-state CR-CC(2,3) triples correction

use super::moments::{left_ijk, moments_ijk, MomentTerm};
use super::{accumulate, log_corrections, TriplesCorrection, TriplesDenominators, TriplesOptions};
use crate::hamiltonian::Hamiltonian;
use ndarray::{s, Array4, ArrayView2, ArrayView4, Axis};
use tracing::info;

/// CR-CC(2,3) calculation for a converged CCSD ground state.
pub struct CRCC23<'a> {
    fock: ArrayView2<'a, f64>,
    hbar: &'a Hamiltonian,
    t2: ArrayView4<'a, f64>,
    l1: ArrayView2<'a, f64>,
    l2: ArrayView4<'a, f64>,
}

impl<'a> CRCC23<'a> {
    /// # Arguments
    ///
    /// * `fock` - Bare Fock matrix over all spin orbitals
    /// * `hbar` - CCSD similarity-transformed Hamiltonian
    /// * `t2` - CCSD doubles `t2[a,b,i,j]`
    /// * `l1`, `l2` - Converged left (Λ) amplitudes `l1[a,i]`, `l2[a,b,i,j]`
    pub fn new(
        fock: ArrayView2<'a, f64>,
        hbar: &'a Hamiltonian,
        t2: ArrayView4<'a, f64>,
        l1: ArrayView2<'a, f64>,
        l2: ArrayView4<'a, f64>,
    ) -> Self {
        CRCC23 {
            fock,
            hbar,
            t2,
            l1,
            l2,
        }
    }

    /// Evaluate the requested corrections.
    pub fn compute(&self, options: &TriplesOptions) -> TriplesCorrection {
        let hbar = self.hbar;
        let (no, nu) = (hbar.no, hbar.nu());

        info!("===========================================");
        info!("     CR-CC(2,3) Triples Correction");
        info!("===========================================");
        info!("Number of occupied spin orbitals: {}", no);
        info!("Number of unoccupied spin orbitals: {}", nu);
        info!("Execution mode: {:?}", options.execution);

        let denominators = TriplesDenominators::new(self.fock, hbar, self.t2, 0.0, &options.labels);
        let i_vooo = vooo_intermediate(hbar, self.t2);
        let (vvov, ov, oovv, vovv, ooov) =
            (hbar.vvov(), hbar.ov(), hbar.oovv(), hbar.vovv(), hbar.ooov());

        let terms = [MomentTerm {
            vvov,
            vooo: i_vooo.view(),
            amplitude: self.t2.reborrow(),
            scale: 1.0,
        }];
        let correction = accumulate(no, nu, &denominators, options, |i, j, k| {
            let m3 = moments_ijk(i, j, k, &terms);
            let l3 = left_ijk(i, j, k, ov, oovv, vovv, ooov, self.l1, self.l2);
            m3 * l3
        });

        log_corrections("CR-CC(2,3) Results", &correction);
        correction
    }
}

/// `I_vooo[a,m,i,j] = h_vooo[a,m,i,j] - sum_e h_ov[m,e] t2[a,e,i,j]`
pub(super) fn vooo_intermediate(hbar: &Hamiltonian, t2: ArrayView4<f64>) -> Array4<f64> {
    let mut intermediate = hbar.vooo().to_owned();
    let h_ov = hbar.ov();
    for (a, mut block) in intermediate.axis_iter_mut(Axis(0)).enumerate() {
        let t2_a = t2.index_axis(Axis(0), a);
        for ((m, i, j), value) in block.indexed_iter_mut() {
            *value -= h_ov.row(m).dot(&t2_a.slice(s![.., i, j]));
        }
    }
    intermediate
}
