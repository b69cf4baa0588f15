// src/interaction/answer.rs

use std::io;

use tracing::debug;

use crate::exec::ProcessExecution;

/// Reply produced by a [`super::ProcessInteraction`] for a partial sentence.
///
/// An answer optionally carries text to write to the process's stdin, and
/// may mark the execution as finished, which ends output consumption even
/// if the OS stream is still open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    text: Option<String>,
    finishes: bool,
}

impl Answer {
    /// No reply and no effect.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finishes: false,
        }
    }

    /// Mark the execution finished without writing anything.
    pub fn finish() -> Self {
        Self {
            text: None,
            finishes: true,
        }
    }

    pub fn with_finish(mut self) -> Self {
        self.finishes = true;
        self
    }

    pub fn reply_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn finishes(&self) -> bool {
        self.finishes
    }

    pub fn is_none(&self) -> bool {
        self.text.is_none() && !self.finishes
    }

    /// Apply this answer to the execution: write the reply (if any) to the
    /// process input and set the finished flag when requested.
    pub async fn reply(&self, execution: &ProcessExecution) -> io::Result<()> {
        if let Some(text) = &self.text {
            debug!(pid = execution.process_id(), reply = %text.trim_end(), "replying to process");
            execution.write_input(text).await?;
        }
        if self.finishes {
            execution.mark_as_finished();
        }
        Ok(())
    }
}
