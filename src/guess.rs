//! CIS initial guesses for excited-state roots
//!
//! The singles-singles block of the Hamiltonian is small enough to diagonalize
//! directly. Its lowest eigenpairs, zero-padded to the full packed space, are
//! the usual starting vectors for the Davidson refinement of each root.

use crate::eigen::eigenpairs;
use crate::error::SolverError;
use crate::hamiltonian::Hamiltonian;
use crate::operator::CisOperator;
use nalgebra::DVector;
use tracing::{debug, info};

/// Asymmetry below which the singles matrix is diagonalized as symmetric.
const SYMMETRY_TOL: f64 = 1e-12;

/// One initial guess: a CIS excitation energy and its singles vector.
#[derive(Debug, Clone)]
pub struct GuessVector {
    pub omega: f64,
    /// Unit-norm singles vector, laid out as `r1[a,i]`
    pub vector: DVector<f64>,
}

/// The `num_roots` lowest CIS eigenpairs of `hamiltonian`, sorted by energy.
///
/// # Arguments
///
/// * `hamiltonian` - Bare or similarity-transformed Hamiltonian
/// * `num_roots` - Number of guesses to return, capped at the singles dimension
/// * `imaginary_tolerance` - Largest imaginary part accepted on a guess energy
pub fn cis_guess(
    hamiltonian: &Hamiltonian,
    num_roots: usize,
    imaginary_tolerance: f64,
) -> Result<Vec<GuessVector>, SolverError> {
    let matrix = CisOperator::new(hamiltonian).dense_matrix()?;
    let n = matrix.nrows();
    let asymmetry = (&matrix - matrix.transpose()).amax();
    debug!("CIS matrix dimension {}, asymmetry {:.3e}", n, asymmetry);

    let mut guesses = if asymmetry < SYMMETRY_TOL {
        let eigen = matrix.symmetric_eigen();
        eigen
            .eigenvalues
            .iter()
            .zip(eigen.eigenvectors.column_iter())
            .map(|(&omega, v)| GuessVector {
                omega,
                vector: v.into_owned(),
            })
            .collect::<Vec<_>>()
    } else {
        eigenpairs(&matrix)?
            .into_iter()
            .map(|pair| {
                pair.into_real(imaginary_tolerance)
                    .map(|(omega, vector)| GuessVector { omega, vector })
            })
            .collect::<Result<Vec<_>, _>>()?
    };
    guesses.sort_by(|a, b| a.omega.total_cmp(&b.omega));
    guesses.truncate(num_roots);

    info!("===========================================");
    info!("         CIS Initial Guesses");
    info!("===========================================");
    info!("{:>5} {:>18}", "Root", "Energy (Eh)");
    info!("{}", "-".repeat(24));
    for (root, guess) in guesses.iter().enumerate() {
        info!("{:>5} {:>18.10}", root, guess.omega);
    }
    Ok(guesses)
}
