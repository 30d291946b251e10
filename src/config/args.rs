//! Command-line argument parsing for EOM root calculations

use clap::Parser;

/// Davidson refinement of CIS-guessed excited states from an FCIDUMP file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override maximum Davidson iterations
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Override convergence threshold on |dE| and |r|
    #[arg(long)]
    pub convergence_threshold: Option<f64>,

    /// Override the subspace size that triggers a restart
    #[arg(long)]
    pub max_subspace_size: Option<usize>,

    /// Override the number of Ritz vectors kept across a restart
    #[arg(long)]
    pub restart_depth: Option<usize>,
}
