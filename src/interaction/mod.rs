// src/interaction/mod.rs

//! Interaction protocol between a running process and its controller.
//!
//! Process output is consumed character by character into a [`Sentence`].
//! After every character a [`ProcessInteraction`] policy is asked for an
//! [`Answer`], which may write a reply to the process's stdin or mark the
//! execution as finished.
//!
//! - [`sentence`] holds the accumulating output buffer.
//! - [`answer`] holds the reply type and how it is applied.
//! - [`builder`] provides a regex-driven policy built from rules.

pub mod answer;
pub mod builder;
pub mod sentence;

pub use answer::Answer;
pub use builder::{ProcessInteractionBuilder, RegexInteraction, WhenBuilder};
pub use sentence::Sentence;

/// Pluggable strategy deciding how process output is answered and echoed.
pub trait ProcessInteraction: Send + Sync {
    /// Whether the process needs stdin at all. When this returns `false` the
    /// consumer closes stdin up front; some platforms never report EOF on
    /// stdout while the input pipe is open.
    fn requires_input_interaction(&self) -> bool;

    /// Answer for the sentence accumulated so far.
    fn replies_to(&self, sentence: &Sentence) -> Answer;

    /// Whether a completed sentence is echoed to stdout.
    fn should_output(&self, sentence: &Sentence) -> bool;

    /// Whether a completed sentence is echoed to stderr.
    fn should_output_to_err(&self, sentence: &Sentence) -> bool;
}

/// Policy for processes that need no input: never replies, echoes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInteraction;

impl ProcessInteraction for NoInteraction {
    fn requires_input_interaction(&self) -> bool {
        false
    }

    fn replies_to(&self, _sentence: &Sentence) -> Answer {
        Answer::none()
    }

    fn should_output(&self, _sentence: &Sentence) -> bool {
        false
    }

    fn should_output_to_err(&self, _sentence: &Sentence) -> bool {
        false
    }
}

impl<T> ProcessInteraction for std::sync::Arc<T>
where
    T: ProcessInteraction + ?Sized,
{
    fn requires_input_interaction(&self) -> bool {
        (**self).requires_input_interaction()
    }

    fn replies_to(&self, sentence: &Sentence) -> Answer {
        (**self).replies_to(sentence)
    }

    fn should_output(&self, sentence: &Sentence) -> bool {
        (**self).should_output(sentence)
    }

    fn should_output_to_err(&self, sentence: &Sentence) -> bool {
        (**self).should_output_to_err(sentence)
    }
}
