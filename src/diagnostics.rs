//! Post-processing diagnostics of converged EOM roots
//!
//! * `r0` - reference component of an EE right eigenvector
//! * REL - relative excitation level, about 1 for singly and 2 for doubly excited states
//! * left/right biorthonormalization `<L|R> = 1`

use crate::davidson_impl::EigenSolution;
use crate::error::SolverError;
use crate::hamiltonian::Hamiltonian;
use crate::tensor::{PackedLayout, Space};
use nalgebra::DVector;
use ndarray::{ArrayView2, ArrayView4, Ix2, Ix4};
use tracing::info;

/// Reference component of an EE right eigenvector.
///
/// `r0 = (sum_me h_ov[m,e] r1[e,m] + 1/4 sum_mnef h_oovv[m,n,e,f] r2[e,f,m,n]) / omega`,
/// and `0` for `omega == 0`.
pub fn calc_r0(
    hamiltonian: &Hamiltonian,
    r1: ArrayView2<f64>,
    r2: Option<ArrayView4<f64>>,
    omega: f64,
) -> f64 {
    if omega == 0.0 {
        return 0.0;
    }
    let ov = hamiltonian.ov();
    let mut value: f64 = ov.t().iter().zip(r1.iter()).map(|(h, r)| h * r).sum();
    if let Some(r2) = r2 {
        let oovv = hamiltonian.oovv().permuted_axes([2, 3, 0, 1]);
        value += 0.25 * oovv.iter().zip(r2.iter()).map(|(h, r)| h * r).sum::<f64>();
    }
    value / omega
}

/// Relative excitation level of a packed right vector.
///
/// `REL = sum_n n w_n |r_n|^2 / (r0^2 + sum_n w_n |r_n|^2)`, `n` being the number of
/// unoccupied indices of block `n` and `w_n` its unique-amplitude weight.
pub fn calc_rel(r0: f64, layout: &PackedLayout, x: &DVector<f64>) -> Result<f64, SolverError> {
    let weights = layout.block_weights_sqr(x)?;
    let mut numerator = 0.0;
    let mut denominator = r0 * r0;
    for (block, w) in layout.blocks().iter().zip(weights) {
        numerator += block.particle_rank() as f64 * w;
        denominator += w;
    }
    if denominator == 0.0 {
        return Ok(0.0);
    }
    Ok(numerator / denominator)
}

/// Scale `left` so that `<L|R> = 1` in the weighted inner product of `layout`.
///
/// Returns the overlap before scaling.
pub fn biorthonormalize(
    left: &mut DVector<f64>,
    right: &DVector<f64>,
    layout: &PackedLayout,
) -> Result<f64, SolverError> {
    let overlap = layout.weighted_dot(left, right)?;
    if overlap.abs() < f64::EPSILON {
        return Err(SolverError::ZeroOverlap { overlap });
    }
    *left /= overlap;
    Ok(overlap)
}

/// A converged EOM root with its diagnostics.
#[derive(Debug, Clone)]
pub struct EomRoot {
    pub omega: f64,
    pub r0: f64,
    pub rel: f64,
    pub residual_norm: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl EomRoot {
    /// Attach `r0` and REL to a solver result laid out by `layout`.
    ///
    /// `r0` is only defined for EE layouts whose first block is `r1[a,i]`; it is
    /// zero for IP/DIP layouts.
    pub fn from_solution(
        solution: &EigenSolution,
        hamiltonian: &Hamiltonian,
        layout: &PackedLayout,
    ) -> Result<Self, SolverError> {
        use Space::*;
        let blocks = layout.split(solution.vector.as_slice())?;
        let r0 = if block_is(layout, 0, &[Unoccupied, Occupied]) {
            let r1 = blocks[0].view().into_dimensionality::<Ix2>().map_err(|_| {
                SolverError::DimensionMismatch {
                    expected: layout.ndim(),
                    found: solution.vector.len(),
                }
            })?;
            let r2 = if block_is(layout, 1, &[Unoccupied, Unoccupied, Occupied, Occupied]) {
                blocks[1].view().into_dimensionality::<Ix4>().ok()
            } else {
                None
            };
            calc_r0(hamiltonian, r1, r2, solution.omega)
        } else {
            0.0
        };
        let rel = calc_rel(r0, layout, &solution.vector)?;
        info!("Root omega {:.10} Eh: r0 = {:.8}, REL = {:.6}", solution.omega, r0, rel);
        Ok(EomRoot {
            omega: solution.omega,
            r0,
            rel,
            residual_norm: solution.residual_norm,
            iterations: solution.iterations,
            converged: solution.converged,
        })
    }
}

fn block_is(layout: &PackedLayout, block: usize, axes: &[Space]) -> bool {
    layout.blocks().get(block).map(|spec| spec.axes()) == Some(axes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array4};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_hamiltonian(no: usize, nu: usize, seed: u64) -> Hamiltonian {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = no + nu;
        let h1 = Array2::from_shape_fn((n, n), |_| rng.gen_range(-1.0..1.0));
        let h2 = Array4::from_shape_fn((n, n, n, n), |_| rng.gen_range(-1.0..1.0));
        Hamiltonian::new(h1, h2, no).unwrap()
    }

    #[test]
    fn test_r0_explicit_sum() {
        let (no, nu) = (2, 3);
        let ham = random_hamiltonian(no, nu, 3);
        let mut rng = StdRng::seed_from_u64(4);
        let r1 = Array2::from_shape_fn((nu, no), |_| rng.gen_range(-1.0..1.0));
        let r2 = Array4::from_shape_fn((nu, nu, no, no), |_| rng.gen_range(-1.0..1.0));

        let (ov, oovv) = (ham.ov(), ham.oovv());
        let mut expected = 0.0;
        for m in 0..no {
            for e in 0..nu {
                expected += ov[[m, e]] * r1[[e, m]];
                for n in 0..no {
                    for f in 0..nu {
                        expected += 0.25 * oovv[[m, n, e, f]] * r2[[e, f, m, n]];
                    }
                }
            }
        }
        let r0 = calc_r0(&ham, r1.view(), Some(r2.view()), 0.7);
        assert!((r0 - expected / 0.7).abs() < 1e-12);
        assert_eq!(calc_r0(&ham, r1.view(), Some(r2.view()), 0.0), 0.0);
    }

    #[test]
    fn test_rel_of_pure_singles_and_doubles() {
        let layout = PackedLayout::ee_singles_doubles(2, 2);
        let mut singles = DVector::zeros(layout.ndim());
        singles[1] = 1.0;
        assert!((calc_rel(0.0, &layout, &singles).unwrap() - 1.0).abs() < 1e-14);

        let mut doubles = DVector::zeros(layout.ndim());
        doubles[layout.offset(1) + 3] = 1.0;
        assert!((calc_rel(0.0, &layout, &doubles).unwrap() - 2.0).abs() < 1e-14);

        // reference weight only dilutes the level
        let rel = calc_rel(1.0, &layout, &singles).unwrap();
        assert!((rel - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_rel_counts_particles_for_ip() {
        let layout = PackedLayout::ip_3h2p(3, 2);
        let mut x = DVector::zeros(layout.ndim());
        x[0] = 1.0;
        assert_eq!(calc_rel(0.0, &layout, &x).unwrap(), 0.0);
    }

    #[test]
    fn test_biorthonormalize() {
        let layout = PackedLayout::ee_singles_doubles(2, 2);
        let mut rng = StdRng::seed_from_u64(5);
        let right = DVector::from_fn(layout.ndim(), |_, _| rng.gen_range(-1.0..1.0));
        let mut left = &right * 3.0;
        let overlap = biorthonormalize(&mut left, &right, &layout).unwrap();
        assert!(overlap > 0.0);
        assert!((layout.weighted_dot(&left, &right).unwrap() - 1.0).abs() < 1e-12);

        let mut zero = DVector::zeros(layout.ndim());
        assert!(matches!(
            biorthonormalize(&mut zero, &right, &layout),
            Err(SolverError::ZeroOverlap { .. })
        ));
    }

    #[test]
    fn test_root_from_solution() {
        let (no, nu) = (2, 2);
        let ham = random_hamiltonian(no, nu, 6);
        let layout = PackedLayout::ee_singles(no, nu);
        let mut vector = DVector::zeros(layout.ndim());
        vector[0] = 1.0;
        let solution = EigenSolution {
            omega: 0.5,
            vector,
            residual_norm: 1e-8,
            delta_omega: 1e-9,
            iterations: 4,
            converged: true,
        };
        let root = EomRoot::from_solution(&solution, &ham, &layout).unwrap();
        // r1[a=0,i=0] = 1
        let expected_r0 = ham.ov()[[0, 0]] / 0.5;
        assert!((root.r0 - expected_r0).abs() < 1e-12);
        assert!((root.rel - 1.0 / (1.0 + expected_r0 * expected_r0)).abs() < 1e-12);
        assert!(root.converged);

        let ip = PackedLayout::ip_3h2p(no, nu);
        let solution = EigenSolution {
            vector: DVector::from_element(ip.ndim(), 0.1),
            ..solution
        };
        assert_eq!(EomRoot::from_solution(&solution, &ham, &ip).unwrap().r0, 0.0);
    }
}
