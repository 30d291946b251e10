//! Triples moments `M3(abc)` and left amplitudes `L3(abc)` for one occupied triple
//!
//! Both are returned as fully antisymmetric `nu^3` blocks for a fixed `i<j<k`.

use crate::tensor::{
    add_contract_abe_ec, add_contract_am_bcm, add_outer_a_bc, add_outer_ab_c, antisymmetrize_abc,
};
use ndarray::{s, Array3, ArrayView2, ArrayView4};

/// One `vvov * amplitude - vooo * amplitude` contribution to a moment.
///
/// The ground-state moment is a single term `(h_vvov, I_vooo, t2)`. The
/// excited-state moment adds `(h_vvov, h_vooo, r2)` and `(X_vvov, X_vooo, t2)`
/// to an `r0`-scaled ground term.
#[derive(Debug, Clone, Copy)]
pub struct MomentTerm<'a> {
    /// `[a,b,i,e]`
    pub vvov: ArrayView4<'a, f64>,
    /// `[a,m,i,j]`
    pub vooo: ArrayView4<'a, f64>,
    /// Doubles-like amplitude `[a,b,i,j]`
    pub amplitude: ArrayView4<'a, f64>,
    pub scale: f64,
}

/// `M3(abc)` for the occupied triple `i,j,k`, antisymmetrized over `abc`.
pub fn moments_ijk(i: usize, j: usize, k: usize, terms: &[MomentTerm]) -> Array3<f64> {
    let nu = terms.first().map_or(0, |t| t.amplitude.shape()[0]);
    let mut m3 = Array3::zeros((nu, nu, nu));
    for term in terms {
        let f = 0.5 * term.scale;
        let (vvov, vooo, amp) = (term.vvov, term.vooo, term.amplitude);

        add_contract_abe_ec(&mut m3, f, vvov.slice(s![.., .., i, ..]), amp.slice(s![.., .., j, k]));
        add_contract_abe_ec(&mut m3, -f, vvov.slice(s![.., .., j, ..]), amp.slice(s![.., .., i, k]));
        add_contract_abe_ec(&mut m3, -f, vvov.slice(s![.., .., k, ..]), amp.slice(s![.., .., j, i]));

        add_contract_am_bcm(&mut m3, -f, vooo.slice(s![.., .., i, j]), amp.slice(s![.., .., .., k]));
        add_contract_am_bcm(&mut m3, f, vooo.slice(s![.., .., k, j]), amp.slice(s![.., .., .., i]));
        add_contract_am_bcm(&mut m3, f, vooo.slice(s![.., .., i, k]), amp.slice(s![.., .., .., j]));
    }
    antisymmetrize_abc(&mut m3);
    m3
}

/// `L3(abc)` for the occupied triple `i,j,k`, antisymmetrized over `abc`.
///
/// # Arguments
///
/// * `h1_ov` - `h[i,a]`
/// * `h2_oovv` - `h[i,j,a,b]`
/// * `h2_vovv` - `h[e,i,b,a]`
/// * `h2_ooov` - `h[j,i,m,a]`
/// * `l1`, `l2` - Left amplitudes `l1[a,i]`, `l2[a,b,i,j]`
#[allow(clippy::too_many_arguments)]
pub fn left_ijk(
    i: usize,
    j: usize,
    k: usize,
    h1_ov: ArrayView2<f64>,
    h2_oovv: ArrayView4<f64>,
    h2_vovv: ArrayView4<f64>,
    h2_ooov: ArrayView4<f64>,
    l1: ArrayView2<f64>,
    l2: ArrayView4<f64>,
) -> Array3<f64> {
    let nu = l1.shape()[0];
    let mut l3 = Array3::zeros((nu, nu, nu));

    // vovv[e,x,b,a] viewed as [a,b,e]
    let vovv = |x: usize| h2_vovv.slice_move(s![.., x, .., ..]).permuted_axes([2, 1, 0]);
    add_contract_abe_ec(&mut l3, 0.5, vovv(i), l2.slice(s![.., .., j, k]));
    add_contract_abe_ec(&mut l3, -0.5, vovv(j), l2.slice(s![.., .., i, k]));
    add_contract_abe_ec(&mut l3, -0.5, vovv(k), l2.slice(s![.., .., j, i]));

    // ooov[p,q,m,a] viewed as [a,m]
    let ooov = |p: usize, q: usize| h2_ooov.slice_move(s![p, q, .., ..]).reversed_axes();
    add_contract_am_bcm(&mut l3, -0.5, ooov(j, i), l2.slice(s![.., .., .., k]));
    add_contract_am_bcm(&mut l3, 0.5, ooov(k, i), l2.slice(s![.., .., .., j]));
    add_contract_am_bcm(&mut l3, 0.5, ooov(j, k), l2.slice(s![.., .., .., i]));

    add_outer_ab_c(&mut l3, 0.5, h2_oovv.slice(s![i, j, .., ..]), l1.column(k));
    add_outer_ab_c(&mut l3, -0.5, h2_oovv.slice(s![k, j, .., ..]), l1.column(i));
    add_outer_ab_c(&mut l3, -0.5, h2_oovv.slice(s![i, k, .., ..]), l1.column(j));

    add_outer_a_bc(&mut l3, 0.5, h1_ov.row(i), l2.slice(s![.., .., j, k]));
    add_outer_a_bc(&mut l3, -0.5, h1_ov.row(j), l2.slice(s![.., .., i, k]));
    add_outer_a_bc(&mut l3, -0.5, h1_ov.row(k), l2.slice(s![.., .., j, i]));

    antisymmetrize_abc(&mut l3);
    l3
}
