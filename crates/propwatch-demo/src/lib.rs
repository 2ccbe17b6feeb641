#![forbid(unsafe_code)]

//! Command-line demo for `propwatch`.
//!
//! Observes `[1,2,3,4,5,6,7,8,9,0]` (or a JSON document), removes one entry,
//! and prints each intercepted `read` / `write` followed by a summary.

pub mod cli;
pub mod error;
pub mod logging;
pub mod scenario;

use clap::Parser;

pub use cli::{Cli, EventsArg, LogFormat};
pub use error::{DemoError, Result};
pub use scenario::{REFERENCE_LIST, Summary, run};

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format)?;
    run(&cli, std::io::stdout())?;
    Ok(())
}
