//! Excited states from an FCIDUMP file with YAML configuration

use color_eyre::eyre::Result;
use eomcc::app::EomApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    EomApplication::from_cli()?.run()
}
