//! Logging arguments and tracing subscriber setup.
//!
//! Verbosity is taken from the `-v` count and can be overridden per target
//! with `RUST_LOG`:
//!
//! ```text
//! datamarket-bench run            # WARN
//! datamarket-bench run -v         # INFO: phase and batch boundaries
//! datamarket-bench run -vv        # DEBUG: every failed setup item
//! datamarket-bench run -vvv       # TRACE: every attempt
//! ```

use std::io;

use clap::{ArgAction, Parser, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Full format with timestamp, level, target and spans.
    #[default]
    Full,
    /// Compact format with minimal metadata.
    Compact,
    /// JSON lines for log aggregation.
    Json,
}

/// Logging configuration arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Increase logging verbosity (-v INFO, -vv DEBUG, -vvv TRACE).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Log output format.
    #[arg(
        long = "log-format",
        default_value = "full",
        env = "DATAMARKET_BENCH_LOG_FORMAT",
        global = true
    )]
    pub log_format: LogFormat,
}

impl LogArgs {
    /// Converts the verbosity count to a [`LevelFilter`].
    #[inline]
    pub const fn log_level_filter(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Installs the global tracing subscriber.
    ///
    /// Logs go to stderr so the summary printed on stdout stays machine-readable.
    /// Fails if a global subscriber is already set.
    pub fn init_tracing(&self) -> Result<(), tracing_subscriber::util::TryInitError> {
        let filter = EnvFilter::builder()
            .with_default_directive(self.log_level_filter().into())
            .from_env_lossy();

        let base = tracing_subscriber::fmt::layer().with_writer(io::stderr);
        let layer = match self.log_format {
            LogFormat::Full => base.boxed(),
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Json => base.json().boxed(),
        };

        tracing_subscriber::registry().with(filter).with(layer).try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let mut args = LogArgs::default();
        assert_eq!(args.log_level_filter(), LevelFilter::WARN);
        args.verbosity = 1;
        assert_eq!(args.log_level_filter(), LevelFilter::INFO);
        args.verbosity = 2;
        assert_eq!(args.log_level_filter(), LevelFilter::DEBUG);
        args.verbosity = 9;
        assert_eq!(args.log_level_filter(), LevelFilter::TRACE);
    }

    #[test]
    fn test_parse_log_args() {
        let args = LogArgs::try_parse_from(["test", "-vv", "--log-format", "json"]).unwrap();
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.log_format, LogFormat::Json);
    }
}
