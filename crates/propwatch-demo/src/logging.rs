//! Diagnostic logging on stderr.
//!
//! stdout carries the event stream, so log lines never go there.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::LogFormat;
use crate::error::{DemoError, Result};

/// Build the filter: `RUST_LOG` wins, otherwise `fallback`.
pub fn env_filter(fallback: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|error| DemoError::logging(format!("invalid log filter {fallback:?}: {error}")))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(level: &str, format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(level)?);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|error| DemoError::logging(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_fallback_filter_is_rejected() {
        // Only meaningful when RUST_LOG does not override the fallback.
        if std::env::var_os("RUST_LOG").is_none() {
            let error = env_filter("propwatch=[[").expect_err("bad directive");
            assert!(matches!(error, DemoError::Logging { .. }));
        }
    }

    #[test]
    fn level_names_are_valid_filters() {
        for level in ["error", "warn", "info", "debug", "trace", "propwatch=debug"] {
            assert!(env_filter(level).is_ok(), "{level}");
        }
    }
}
