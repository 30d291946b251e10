//! Excited-state CR-EOMCC(2,3) triples correction

use super::crcc23::vooo_intermediate;
use super::moments::{left_ijk, moments_ijk, MomentTerm};
use super::{accumulate, log_corrections, TriplesCorrection, TriplesDenominators, TriplesOptions};
use crate::hamiltonian::Hamiltonian;
use ndarray::{Array2, Array4, ArrayView2, ArrayView4};
use tracing::info;

/// CR-EOMCC(2,3) calculation for one converged EOMCCSD root.
pub struct CREOMCC23<'a> {
    fock: ArrayView2<'a, f64>,
    hbar: &'a Hamiltonian,
    t2: ArrayView4<'a, f64>,
    l1: ArrayView2<'a, f64>,
    l2: ArrayView4<'a, f64>,
    r1: ArrayView2<'a, f64>,
    r2: ArrayView4<'a, f64>,
    r0: f64,
    omega: f64,
}

impl<'a> CREOMCC23<'a> {
    /// # Arguments
    ///
    /// * `fock` - Bare Fock matrix over all spin orbitals
    /// * `hbar` - CCSD similarity-transformed Hamiltonian
    /// * `t2` - CCSD doubles `t2[a,b,i,j]`
    /// * `l1`, `l2` - Left EOM amplitudes of the root, biorthonormal to the right ones
    /// * `r1`, `r2` - Right EOM amplitudes `r1[a,i]`, `r2[a,b,i,j]`
    /// * `r0` - Reference component of the right state
    /// * `omega` - Excitation energy of the root
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fock: ArrayView2<'a, f64>,
        hbar: &'a Hamiltonian,
        t2: ArrayView4<'a, f64>,
        l1: ArrayView2<'a, f64>,
        l2: ArrayView4<'a, f64>,
        r1: ArrayView2<'a, f64>,
        r2: ArrayView4<'a, f64>,
        r0: f64,
        omega: f64,
    ) -> Self {
        CREOMCC23 {
            fock,
            hbar,
            t2,
            l1,
            l2,
            r1,
            r2,
            r0,
            omega,
        }
    }

    /// `X_ov[m,e] = sum_nf h_oovv[m,n,e,f] r1[f,n]`
    fn x_ov(&self) -> Array2<f64> {
        let oovv = self.hbar.oovv();
        let (no, nu) = (self.hbar.no, self.hbar.nu());
        Array2::from_shape_fn((no, nu), |(m, e)| {
            let mut value = 0.0;
            for n in 0..no {
                for f in 0..nu {
                    value += oovv[[m, n, e, f]] * self.r1[[f, n]];
                }
            }
            value
        })
    }

    /// `X_vvov[b,a,j,e]`, the `(H R)` analogue of `h_vvov`, antisymmetric in `b,a`.
    pub fn x_vvov(&self) -> Array4<f64> {
        let h = self.hbar;
        let (no, nu) = (h.no, h.nu());
        let (voov, vovv, vvvv, ooov) = (h.voov(), h.vovv(), h.vvvv(), h.ooov());
        let (r1, r2, t2) = (self.r1, self.r2, self.t2);
        let x_ov = self.x_ov();

        let mut x = Array4::from_shape_fn((nu, nu, no, nu), |(b, a, j, f)| {
            let mut value = 0.0;
            for m in 0..no {
                value += voov[[a, m, j, f]] * r1[[b, m]];
                value -= 0.5 * x_ov[[m, f]] * t2[[a, b, m, j]];
                for e in 0..nu {
                    value += vovv[[a, m, f, e]] * r2[[b, e, j, m]];
                }
                for n in 0..no {
                    value += 0.25 * ooov[[n, m, j, f]] * r2[[a, b, m, n]];
                }
            }
            for e in 0..nu {
                value += 0.5 * vvvv[[a, b, f, e]] * r1[[e, j]];
            }
            value
        });
        let swapped = x.view().permuted_axes([1, 0, 2, 3]).to_owned();
        x -= &swapped;
        x
    }

    /// `X_vooo[b,m,j,i]`, the `(H R)` analogue of `h_vooo`, antisymmetric in `j,i`.
    pub fn x_vooo(&self) -> Array4<f64> {
        let h = self.hbar;
        let (no, nu) = (h.no, h.nu());
        let (voov, ooov, oooo, vovv) = (h.voov(), h.ooov(), h.oooo(), h.vovv());
        let (r1, r2) = (self.r1, self.r2);

        let mut x = Array4::from_shape_fn((nu, no, no, no), |(b, n, j, i)| {
            let mut value = 0.0;
            for e in 0..nu {
                value -= voov[[b, n, i, e]] * r1[[e, j]];
                for m in 0..no {
                    value += ooov[[n, m, i, e]] * r2[[b, e, j, m]];
                }
                for f in 0..nu {
                    value += 0.25 * vovv[[b, n, f, e]] * r2[[e, f, i, j]];
                }
            }
            for m in 0..no {
                value -= 0.5 * oooo[[n, m, i, j]] * r1[[b, m]];
            }
            value
        });
        let swapped = x.view().permuted_axes([0, 1, 3, 2]).to_owned();
        x -= &swapped;
        x
    }

    /// Evaluate the requested corrections for this root.
    pub fn compute(&self, options: &TriplesOptions) -> TriplesCorrection {
        let hbar = self.hbar;
        let (no, nu) = (hbar.no, hbar.nu());

        info!("===========================================");
        info!("     CR-EOMCC(2,3) Triples Correction");
        info!("===========================================");
        info!("Excitation energy: {:.12} Eh", self.omega);
        info!("Reference weight r0: {:.10}", self.r0);
        info!("Execution mode: {:?}", options.execution);

        let denominators = TriplesDenominators::new(self.fock, hbar, self.t2, self.omega, &options.labels);
        let i_vooo = vooo_intermediate(hbar, self.t2);
        let x_vvov = self.x_vvov();
        let x_vooo = self.x_vooo();
        let (vvov, vooo) = (hbar.vvov(), hbar.vooo());
        let (ov, oovv, vovv, ooov) = (hbar.ov(), hbar.oovv(), hbar.vovv(), hbar.ooov());

        let terms = [
            MomentTerm {
                vvov,
                vooo: i_vooo.view(),
                amplitude: self.t2.reborrow(),
                scale: self.r0,
            },
            MomentTerm {
                vvov,
                vooo,
                amplitude: self.r2.reborrow(),
                scale: 1.0,
            },
            MomentTerm {
                vvov: x_vvov.view(),
                vooo: x_vooo.view(),
                amplitude: self.t2.reborrow(),
                scale: 1.0,
            },
        ];
        let correction = accumulate(no, nu, &denominators, options, |i, j, k| {
            let m3 = moments_ijk(i, j, k, &terms);
            let l3 = left_ijk(i, j, k, ov, oovv, vovv, ooov, self.l1, self.l2);
            m3 * l3
        });

        log_corrections("CR-EOMCC(2,3) Results", &correction);
        correction
    }
}
