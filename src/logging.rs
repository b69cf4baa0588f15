// src/logging.rs

//! Subscriber setup for the `proc-interact` binary.
//!
//! `--log-level` wins over the `PROC_INTERACT_LOG` filter, which defaults
//! to `info`. The env var accepts full `EnvFilter` directives, e.g.
//! `PROC_INTERACT_LOG=info,proc_interact::exec::output_consumer=trace`
//! to log every captured sentence.
//!
//! Logs go to stderr; stdout carries only echoed process output.

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "PROC_INTERACT_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// Filter from the CLI flag, else the env directive, else `info`.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(directive(level)));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value '{directives}'")),
        None => Ok(EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn cli_flag_overrides_env() {
        let filter = build_filter(Some(LogLevel::Debug), Some("error")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn env_accepts_per_module_directives() {
        let filter = build_filter(
            None,
            Some("info,proc_interact::exec::output_consumer=trace"),
        )
        .unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        assert!(filter.to_string().contains("proc_interact::exec::output_consumer=trace"));
    }

    #[test]
    fn blank_env_falls_back_to_info() {
        let unset = build_filter(None, None).unwrap();
        let blank = build_filter(None, Some("  ")).unwrap();
        assert_eq!(unset.max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(blank.max_level_hint(), Some(LevelFilter::INFO));
    }
}
