use std::sync::{Arc, Mutex};

use proc_interact::{Answer, ProcessInteraction, Sentence};

/// A fake interaction that:
/// - records every sentence it is asked about
/// - replies with a fixed answer when the partial sentence contains `trigger`
/// - echoes nothing.
#[derive(Clone)]
pub struct RecordingInteraction {
    trigger: Option<(String, Answer)>,
    requires_input: bool,
    seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingInteraction {
    /// Never replies; stdin is closed up front.
    pub fn passive() -> Self {
        Self {
            trigger: None,
            requires_input: false,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply with `answer` whenever the partial sentence contains `trigger`.
    pub fn replying(trigger: &str, answer: Answer) -> Self {
        Self {
            trigger: Some((trigger.to_string(), answer)),
            requires_input: true,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every partial sentence passed to `replies_to`, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl ProcessInteraction for RecordingInteraction {
    fn requires_input_interaction(&self) -> bool {
        self.requires_input
    }

    fn replies_to(&self, sentence: &Sentence) -> Answer {
        self.seen.lock().unwrap().push(sentence.to_string());
        match &self.trigger {
            Some((trigger, answer)) if sentence.contains(trigger) => answer.clone(),
            _ => Answer::none(),
        }
    }

    fn should_output(&self, _sentence: &Sentence) -> bool {
        false
    }

    fn should_output_to_err(&self, _sentence: &Sentence) -> bool {
        false
    }
}
