use crate::config::Config;
use crate::davidson_impl::{Davidson, DavidsonParams, TracingObserver};
use crate::diagnostics::EomRoot;
use crate::guess::{cis_guess, GuessVector};
use crate::io::SpinSystem;
use crate::operator::CisOperator;
use crate::precond_impl::DiagonalPreconditioner;
use color_eyre::eyre::{eyre, Result, WrapErr};
use tracing::info;

/// One refined root and the guess it started from.
#[derive(Debug, Clone)]
pub struct RootResult {
    /// Index into the energy-sorted guesses
    pub state: usize,
    pub guess_omega: f64,
    pub root: EomRoot,
}

/// Everything the driver reports.
#[derive(Debug, Clone)]
pub struct CalculationSummary {
    pub reference_energy: f64,
    pub guesses: Vec<GuessVector>,
    pub roots: Vec<RootResult>,
}

/// CIS guesses followed by a Davidson refinement of every requested root.
pub fn run_calculation(
    system: &SpinSystem,
    config: &Config,
    params: &DavidsonParams,
) -> Result<CalculationSummary> {
    let h = &system.hamiltonian;
    let guesses = cis_guess(h, config.num_guesses(), params.imaginary_tolerance)
        .wrap_err("CIS guess generation failed")?;

    let operator = CisOperator::new(h);
    let layout = operator.layout().clone();
    let preconditioner = DiagonalPreconditioner::from_layout(&layout, &h.eps_occ(), &h.eps_unocc());
    let solver = Davidson::new(&operator, &preconditioner, *params);

    let mut roots = Vec::new();
    for state in config.roots() {
        let guess = guesses.get(state).ok_or_else(|| {
            eyre!(
                "root {} requested but only {} guesses were generated",
                state,
                guesses.len()
            )
        })?;
        info!("\nRefining root {} from guess energy {:.10} Eh", state, guess.omega);
        let solution = solver
            .solve(&guess.vector, guess.omega, &mut TracingObserver)
            .wrap_err_with(|| format!("Davidson solve for root {} failed", state))?;
        let root = EomRoot::from_solution(&solution, h, &layout)?;
        roots.push(RootResult {
            state,
            guess_omega: guess.omega,
            root,
        });
    }

    Ok(CalculationSummary {
        reference_energy: system.reference_energy,
        guesses,
        roots,
    })
}
