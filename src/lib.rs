//! Subspace eigensolvers, preconditioners and triples corrections for
//! equation-of-motion coupled-cluster methods
//!
//! * [`Davidson`] converges one root of a (possibly non-Hermitian,
//!   energy-dependent) operator given only its action on packed vectors.
//! * [`DiagonalPreconditioner`] supplies the diagonal (DPR) update, optionally
//!   restricted to an active P-space.
//! * [`CRCC23`] and [`CREOMCC23`] add the completely renormalized triples
//!   corrections to converged ground and excited states.

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod eigen;
pub mod error;
pub mod guess;
pub mod hamiltonian;
pub mod io;
pub mod operator;
pub mod tensor;

mod davidson_impl;
mod precond_impl;
mod triples_impl;

pub use davidson_impl::{
    Davidson, DavidsonParams, EigenSolution, HistoryObserver, IterationObserver, IterationRecord,
    RayleighParams, RayleighQuotientSolver, TracingObserver,
};
pub use eigen::RootSelection;
pub use error::{FcidumpError, SolverError};
pub use hamiltonian::Hamiltonian;
pub use operator::{CisOperator, DenseOperator, FnOperator, SigmaOperator};
pub use precond_impl::{zero_outside_pspace, DiagonalPreconditioner, PSpaceMask, Preconditioner};
pub use tensor::{BlockSpec, PackedLayout, Space};
pub use triples_impl::{
    left_ijk, moments_ijk, three_body_diagonal, CorrectionLabel, ExecutionMode, MomentTerm,
    OccupiedTriple, TriplesCorrection, TriplesDenominators, TriplesOptions, CREOMCC23, CRCC23,
};
