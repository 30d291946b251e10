//! Error types shared by the eigensolvers, the packed-vector utilities and the FCIDUMP reader

use thiserror::Error;

/// Failures that stop a solver before it can produce a (possibly unconverged) result.
///
/// Running out of iterations is not an error: solvers report it through
/// [`crate::EigenSolution::converged`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// A vector (typically the initial guess) does not fit the packed space.
    #[error("vector has length {found} but the packed space has dimension {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The initial guess has no component to normalize.
    #[error("initial guess vector has zero norm")]
    ZeroGuess,

    /// The selected subspace root is genuinely complex.
    #[error(
        "selected subspace root {real:.12} {imag:+.3e}i exceeds the imaginary tolerance {tolerance:.1e}"
    )]
    ComplexRoot {
        real: f64,
        imag: f64,
        tolerance: f64,
    },

    /// The Schur decomposition of the projected matrix failed.
    #[error("eigen-decomposition of the {size}x{size} subspace matrix did not converge")]
    EigenDecomposition { size: usize },

    /// An operator-action provider returned a vector of the wrong length.
    #[error("operator returned a vector of length {found}, expected {expected}")]
    OperatorDimension { expected: usize, found: usize },

    /// A P-space mask was attached to a block it does not describe.
    #[error("P-space mask does not match block {block} of the packed layout")]
    PSpaceBlock { block: usize },

    /// Left and right eigenvectors have no overlap to normalize against.
    #[error("left and right vectors are orthogonal, <L|R> = {overlap:.3e}")]
    ZeroOverlap { overlap: f64 },
}

/// Structural problems in an FCIDUMP namelist header.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FcidumpError {
    /// The header never reached `&END` or `/`.
    #[error("FCIDUMP header is not terminated by &END or /")]
    MissingTerminator,

    #[error("FCIDUMP header has no {key} entry")]
    MissingKey { key: &'static str },

    #[error("bad {key} value {value:?} in FCIDUMP header")]
    BadHeaderValue { key: &'static str, value: String },
}
