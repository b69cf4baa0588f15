// src/interaction/builder.rs

use regex::Regex;

use super::{Answer, ProcessInteraction, Sentence};
use crate::errors::{ProcessError, Result};

#[derive(Debug, Clone)]
enum ReplyAction {
    Reply(String),
    Terminate,
}

#[derive(Debug, Clone)]
struct ReplyRule {
    pattern: Regex,
    action: ReplyAction,
}

/// Regex-driven interaction policy produced by [`ProcessInteractionBuilder`].
///
/// - reply rules are evaluated in insertion order against the partial
///   sentence; the first match wins.
/// - `outputs` / `errors` patterns select which completed sentences are
///   echoed to stdout / stderr.
/// - input interaction is required iff at least one reply rule exists.
#[derive(Debug, Clone, Default)]
pub struct RegexInteraction {
    replies: Vec<ReplyRule>,
    outputs: Vec<Regex>,
    errors: Vec<Regex>,
}

impl ProcessInteraction for RegexInteraction {
    fn requires_input_interaction(&self) -> bool {
        !self.replies.is_empty()
    }

    fn replies_to(&self, sentence: &Sentence) -> Answer {
        self.replies
            .iter()
            .find(|rule| rule.pattern.is_match(sentence.as_str()))
            .map(|rule| match &rule.action {
                ReplyAction::Reply(text) => Answer::text(text.clone()),
                ReplyAction::Terminate => Answer::finish(),
            })
            .unwrap_or_default()
    }

    fn should_output(&self, sentence: &Sentence) -> bool {
        self.outputs.iter().any(|re| re.is_match(sentence.as_str()))
    }

    fn should_output_to_err(&self, sentence: &Sentence) -> bool {
        self.errors.iter().any(|re| re.is_match(sentence.as_str()))
    }
}

/// Builder for [`RegexInteraction`].
///
/// ```
/// use proc_interact::interaction::ProcessInteractionBuilder;
///
/// let interaction = ProcessInteractionBuilder::new()
///     .when(r"Continue\?").reply_with("yes\n")
///     .when("^Done").terminate()
///     .outputs(".*")
///     .errors("(?i)error")
///     .build()
///     .unwrap();
/// # let _ = interaction;
/// ```
#[derive(Debug, Default)]
pub struct ProcessInteractionBuilder {
    replies: Vec<(String, ReplyAction)>,
    outputs: Vec<String>,
    errors: Vec<String>,
}

/// Pending reply rule returned by [`ProcessInteractionBuilder::when`].
#[derive(Debug)]
pub struct WhenBuilder {
    parent: ProcessInteractionBuilder,
    pattern: String,
}

impl WhenBuilder {
    /// Write `text` to stdin whenever the partial sentence matches.
    pub fn reply_with(mut self, text: impl Into<String>) -> ProcessInteractionBuilder {
        self.parent
            .replies
            .push((self.pattern, ReplyAction::Reply(text.into())));
        self.parent
    }

    /// Mark the execution finished whenever the partial sentence matches.
    pub fn terminate(mut self) -> ProcessInteractionBuilder {
        self.parent
            .replies
            .push((self.pattern, ReplyAction::Terminate));
        self.parent
    }
}

impl ProcessInteractionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(self, pattern: impl Into<String>) -> WhenBuilder {
        WhenBuilder {
            parent: self,
            pattern: pattern.into(),
        }
    }

    pub fn outputs(mut self, pattern: impl Into<String>) -> Self {
        self.outputs.push(pattern.into());
        self
    }

    pub fn errors(mut self, pattern: impl Into<String>) -> Self {
        self.errors.push(pattern.into());
        self
    }

    /// Compile all patterns. Fails with a configuration error on the first
    /// invalid regex.
    pub fn build(self) -> Result<RegexInteraction> {
        let replies = self
            .replies
            .into_iter()
            .map(|(pattern, action)| {
                Ok(ReplyRule {
                    pattern: compile(&pattern)?,
                    action,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let outputs = self
            .outputs
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        let errors = self
            .errors
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(RegexInteraction {
            replies,
            outputs,
            errors,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| ProcessError::Config(format!("invalid pattern '{pattern}': {e}")))
}
