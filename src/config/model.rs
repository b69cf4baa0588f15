// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Result;
use crate::interaction::{ProcessInteractionBuilder, RegexInteraction};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [environment]
/// LANG = "C"
///
/// [[reply]]
/// when = 'Continue\?'
/// answer = "yes\n"
///
/// [[reply]]
/// when = "^Installation complete"
/// terminate = true
///
/// [output]
/// stdout = [".*"]
/// stderr = ["(?i)error"]
///
/// [schedule]
/// timeout_ms = 60000
/// step_ms = 500
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Variables merged into every spawned process's environment.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Reply rules from `[[reply]]`, evaluated in file order.
    #[serde(default)]
    pub reply: Vec<ReplyConfig>,

    /// Which completed sentences are echoed, from `[output]`.
    #[serde(default)]
    pub output: OutputSection,

    /// Polling budget used when waiting on spawned processes.
    #[serde(default)]
    pub schedule: ScheduleSection,
}

/// One `[[reply]]` entry. Exactly one of `answer` / `terminate` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyConfig {
    /// Regex matched against the partial sentence.
    pub when: String,

    /// Text written to stdin on a match (include the trailing newline).
    #[serde(default)]
    pub answer: Option<String>,

    /// Mark the execution finished on a match.
    #[serde(default)]
    pub terminate: bool,
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputSection {
    #[serde(default)]
    pub stdout: Vec<String>,

    #[serde(default)]
    pub stderr: Vec<String>,
}

/// `[schedule]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSection {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_step_ms() -> u64 {
    500
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            step_ms: default_step_ms(),
        }
    }
}

impl ScheduleSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }
}

/// Validated configuration. Obtain one via `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub environment: BTreeMap<String, String>,
    pub reply: Vec<ReplyConfig>,
    pub output: OutputSection,
    pub schedule: ScheduleSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            environment: raw.environment,
            reply: raw.reply,
            output: raw.output,
            schedule: raw.schedule,
        }
    }

    /// Build the regex interaction described by `[[reply]]` and `[output]`.
    pub fn interaction(&self) -> Result<RegexInteraction> {
        interaction_builder(&self.reply, &self.output).build()
    }
}

pub(crate) fn interaction_builder(
    replies: &[ReplyConfig],
    output: &OutputSection,
) -> ProcessInteractionBuilder {
    let mut builder = ProcessInteractionBuilder::new();

    for reply in replies {
        let when = builder.when(reply.when.clone());
        builder = match &reply.answer {
            Some(answer) => when.reply_with(answer.clone()),
            None => when.terminate(),
        };
    }
    for pattern in &output.stdout {
        builder = builder.outputs(pattern.clone());
    }
    for pattern in &output.stderr {
        builder = builder.errors(pattern.clone());
    }

    builder
}
