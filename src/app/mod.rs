//! Command-line driver: FCIDUMP, CIS guesses, Davidson refinement, summary

mod report;
mod runner;

pub use report::report_summary;
pub use runner::{run_calculation, CalculationSummary, RootResult};

use crate::config::{Args, Config};
use crate::io::{setup_output, Fcidump};
use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fs;
use tracing::info;

pub struct EomApplication {
    args: Args,
    config: Config,
}

impl EomApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args.config_file)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref())?;
        info!("Configuration loaded from {}:\n{:?}", self.args.config_file, self.config);

        let path = self
            .config
            .fcidump
            .as_ref()
            .ok_or_else(|| eyre!("configuration has no `fcidump` entry"))?;
        let fcidump = Fcidump::from_file(path)?;
        let nelec = self.config.nelec.unwrap_or(fcidump.nelec);
        let system = fcidump.spin_system(nelec)?;

        let params = self.config.davidson_params(&self.args);
        let summary = run_calculation(&system, &self.config, &params)?;
        report_summary(&summary);
        Ok(())
    }
}

/// Read a YAML configuration file and fill in defaults.
pub fn load_config(path: &str) -> Result<Config> {
    let config_content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", path))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
