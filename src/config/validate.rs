// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, interaction_builder};
use crate::errors::{ProcessError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ProcessError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - every `[environment]` value is a non-empty string
/// - each `[[reply]]` sets exactly one of `answer` / `terminate`
/// - all reply and output patterns compile
/// - `[schedule]` has `0 < step_ms <= timeout_ms`
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_environment(cfg)?;
    validate_replies(cfg)?;
    validate_patterns(cfg)?;
    validate_schedule(cfg)?;
    Ok(())
}

fn validate_environment(cfg: &RawConfigFile) -> Result<()> {
    for (name, value) in cfg.environment.iter() {
        if value.is_empty() {
            return Err(ProcessError::Config(format!(
                "[environment].{name} must be a non-empty string"
            )));
        }
    }
    Ok(())
}

fn validate_replies(cfg: &RawConfigFile) -> Result<()> {
    for (idx, reply) in cfg.reply.iter().enumerate() {
        match (&reply.answer, reply.terminate) {
            (Some(_), true) => {
                return Err(ProcessError::Config(format!(
                    "[[reply]] #{idx} ('{}') sets both `answer` and `terminate`",
                    reply.when
                )));
            }
            (None, false) => {
                return Err(ProcessError::Config(format!(
                    "[[reply]] #{idx} ('{}') needs either `answer` or `terminate = true`",
                    reply.when
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    interaction_builder(&cfg.reply, &cfg.output).build()?;
    Ok(())
}

fn validate_schedule(cfg: &RawConfigFile) -> Result<()> {
    let schedule = &cfg.schedule;
    if schedule.step_ms == 0 {
        return Err(ProcessError::Config(
            "[schedule].step_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if schedule.step_ms > schedule.timeout_ms {
        return Err(ProcessError::Config(format!(
            "[schedule].step_ms ({}) must not exceed timeout_ms ({})",
            schedule.step_ms, schedule.timeout_ms
        )));
    }
    Ok(())
}
