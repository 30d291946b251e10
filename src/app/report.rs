use super::runner::CalculationSummary;
use tracing::{info, warn};

pub fn report_summary(summary: &CalculationSummary) {
    info!("===========================================");
    info!("         Excited-State Summary");
    info!("===========================================");
    info!("Reference energy: {:.10} Eh", summary.reference_energy);
    info!(
        "{:>5} {:>16} {:>16} {:>18} {:>10} {:>8} {:>6}",
        "State", "Guess (Eh)", "Omega (Eh)", "Total (Eh)", "r0", "REL", "Iter"
    );
    info!("{}", "-".repeat(85));
    for result in &summary.roots {
        let root = &result.root;
        info!(
            "{:>5} {:>16.10} {:>16.10} {:>18.10} {:>10.6} {:>8.4} {:>6}",
            result.state,
            result.guess_omega,
            root.omega,
            summary.reference_energy + root.omega,
            root.r0,
            root.rel,
            root.iterations
        );
    }
    for result in summary.roots.iter().filter(|r| !r.root.converged) {
        warn!(
            "State {} not converged: residual norm {:.3e}",
            result.state, result.root.residual_norm
        );
    }
}
