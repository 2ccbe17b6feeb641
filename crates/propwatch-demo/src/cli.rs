//! Command-line arguments for the demo.
//!
//! Every option can also be set through a `PROPWATCH_*` environment
//! variable. Flags take precedence over the environment, which takes
//! precedence over the defaults.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use propwatch::{CyclePolicy, EventFormat, ObserverConfig, RemovalPolicy};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "propwatch-demo",
    about = "Observe a list or map, remove one entry, and print every intercepted access",
    version
)]
pub struct Cli {
    /// JSON array or object to observe instead of `[1,2,3,4,5,6,7,8,9,0]`.
    #[arg(long, env = "PROPWATCH_INPUT")]
    pub input: Option<PathBuf>,

    /// Entry to remove after observation: a list index or a map key.
    /// Defaults to the first entry.
    #[arg(long, env = "PROPWATCH_REMOVE")]
    pub remove: Option<String>,

    /// Observe only; skip the removal step.
    #[arg(long = "no-remove", env = "PROPWATCH_NO_REMOVE")]
    pub no_remove: bool,

    /// How removal treats the accessors of shifted list positions.
    #[arg(long, env = "PROPWATCH_REMOVAL", default_value = "shift-through")]
    pub removal: RemovalPolicy,

    /// What to do when a container contains one of its ancestors.
    #[arg(long, env = "PROPWATCH_CYCLES", default_value = "skip")]
    pub cycles: CyclePolicy,

    /// Maximum nesting depth to observe (root is depth 0).
    #[arg(long = "max-depth", env = "PROPWATCH_MAX_DEPTH")]
    pub max_depth: Option<usize>,

    /// How access events are printed to stdout.
    #[arg(long, env = "PROPWATCH_EVENTS", value_enum, default_value_t = EventsArg::Plain)]
    pub events: EventsArg,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long = "log-level", env = "PROPWATCH_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log line format on stderr.
    #[arg(long = "log-format", env = "PROPWATCH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn observer_config(&self) -> ObserverConfig {
        let config = ObserverConfig::new()
            .with_cycle_policy(self.cycles)
            .with_removal_policy(self.removal);
        match self.max_depth {
            Some(limit) => config.with_max_depth(limit),
            None => config,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventsArg {
    /// `read` / `write`, one per line.
    Plain,
    /// Kind and install path.
    Verbose,
    /// One JSON object per event.
    Json,
    /// Print no events, only the summary.
    None,
}

impl From<EventsArg> for EventFormat {
    fn from(arg: EventsArg) -> Self {
        match arg {
            EventsArg::Plain => Self::Plain,
            EventsArg::Verbose => Self::Verbose,
            EventsArg::Json => Self::Json,
            EventsArg::None => Self::Silent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}
