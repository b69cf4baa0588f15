// src/interaction/sentence.rs

use std::fmt;

use super::answer::Answer;

/// One logical unit of process output, usually a line or a prompt.
///
/// Characters are appended one at a time while output is consumed. A
/// sentence is complete once it ends with a line terminator; the consumer
/// then flushes it to the execution's output log and resets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    buf: String,
}

impl Sentence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_char(&mut self, c: char) -> &mut Self {
        self.buf.push(c);
        self
    }

    pub fn append_str(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    /// Record the reply text of an answer as part of this sentence.
    pub fn append_answer(&mut self, answer: &Answer) -> &mut Self {
        if let Some(text) = answer.reply_text() {
            self.buf.push_str(text);
        }
        self
    }

    pub fn is_finished(&self) -> bool {
        self.buf.ends_with('\n')
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Strip surrounding whitespace in place.
    pub fn trim(&mut self) -> &mut Self {
        let trimmed = self.buf.trim();
        if trimmed.len() != self.buf.len() {
            self.buf = trimmed.to_string();
        }
        self
    }

    pub fn reset(&mut self) -> &mut Self {
        self.buf.clear();
        self
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.buf.contains(pattern)
    }
}

impl From<&str> for Sentence {
    fn from(s: &str) -> Self {
        Self { buf: s.to_string() }
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}
