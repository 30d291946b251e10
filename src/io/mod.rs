//! Input/Output for the command-line driver
//!
//! FCIDUMP integral loading and logging setup.

mod fcidump;
mod output;

pub use fcidump::{Fcidump, SpinSystem};
pub use output::setup_output;
