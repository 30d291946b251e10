//! Logging setup for the command-line driver

use color_eyre::eyre::{Result, WrapErr};
use std::fmt;
use std::fs::File;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Wall time since start-up, whole seconds
struct ElapsedSeconds(Instant);

impl FormatTime for ElapsedSeconds {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total = self.0.elapsed().as_secs();
        write!(
            w,
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total / 60) % 60,
            total % 60
        )
    }
}

/// Send log output to `output_path`, or to stdout when none is given.
pub fn setup_output(output_path: Option<&String>) -> Result<()> {
    let timer = ElapsedSeconds(Instant::now());
    match output_path {
        Some(path) => {
            let log = File::create(path)
                .wrap_err_with(|| format!("Could not create output file: {}", path))?;
            let file_layer = layer()
                .with_writer(log)
                .with_timer(timer)
                .with_ansi(false);
            Registry::default().with(file_layer).try_init()?;
            info!("Output written to: {}", path);
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(timer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).try_init()?;
        }
    }
    Ok(())
}
