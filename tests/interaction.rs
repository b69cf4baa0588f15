// tests/interaction.rs

use std::error::Error;

use proptest::prelude::*;
use proc_interact::{
    Answer, NoInteraction, ProcessError, ProcessInteraction, ProcessInteractionBuilder, Sentence,
};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn no_interaction_never_replies_or_echoes() {
    let sentence = Sentence::from("Continue? ");

    assert!(!NoInteraction.requires_input_interaction());
    assert!(NoInteraction.replies_to(&sentence).is_none());
    assert!(!NoInteraction.should_output(&sentence));
    assert!(!NoInteraction.should_output_to_err(&sentence));
}

#[test]
fn builder_requires_input_only_with_reply_rules() -> TestResult {
    let echo_only = ProcessInteractionBuilder::new().outputs(".*").build()?;
    assert!(!echo_only.requires_input_interaction());

    let replying = ProcessInteractionBuilder::new()
        .when("password:")
        .reply_with("secret\n")
        .build()?;
    assert!(replying.requires_input_interaction());
    Ok(())
}

#[test]
fn first_matching_reply_rule_wins() -> TestResult {
    let interaction = ProcessInteractionBuilder::new()
        .when(r"\[y/N\]")
        .reply_with("y\n")
        .when("Proceed")
        .reply_with("n\n")
        .when("^Done")
        .terminate()
        .build()?;

    let answer = interaction.replies_to(&Sentence::from("Proceed? [y/N]"));
    assert_eq!(answer, Answer::text("y\n"));

    let answer = interaction.replies_to(&Sentence::from("Proceed?"));
    assert_eq!(answer, Answer::text("n\n"));

    let answer = interaction.replies_to(&Sentence::from("Done"));
    assert!(answer.finishes());
    assert_eq!(answer.reply_text(), None);

    assert!(interaction.replies_to(&Sentence::from("nothing")).is_none());
    Ok(())
}

#[test]
fn output_and_error_patterns_select_echoed_sentences() -> TestResult {
    let interaction = ProcessInteractionBuilder::new()
        .outputs("^INFO")
        .errors("(?i)error")
        .build()?;

    assert!(interaction.should_output(&Sentence::from("INFO started")));
    assert!(!interaction.should_output(&Sentence::from("DEBUG noise")));
    assert!(interaction.should_output_to_err(&Sentence::from("Fatal ERROR")));
    assert!(!interaction.should_output_to_err(&Sentence::from("INFO started")));
    Ok(())
}

#[test]
fn invalid_pattern_is_a_config_error() {
    let result = ProcessInteractionBuilder::new()
        .when("(unclosed")
        .reply_with("x\n")
        .build();

    match result {
        Err(ProcessError::Config(msg)) => assert!(msg.contains("(unclosed")),
        Err(e) => panic!("Expected Config error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn answer_text_completes_the_sentence() {
    let mut sentence = Sentence::new();
    for c in "Continue? ".chars() {
        sentence.append_char(c);
    }
    assert!(!sentence.is_finished());

    sentence.append_answer(&Answer::text("yes\n"));
    assert!(sentence.is_finished());

    sentence.trim();
    assert_eq!(sentence.as_str(), "Continue? yes");

    sentence.reset();
    assert!(sentence.is_empty());
}

#[test]
fn answer_without_text_leaves_sentence_untouched() {
    let mut sentence = Sentence::from("abc");
    sentence.append_answer(&Answer::finish());
    assert_eq!(sentence.to_string(), "abc");
}

proptest! {
    #[test]
    fn sentence_is_finished_iff_it_ends_with_newline(text in "[a-z \n]{0,20}") {
        let mut sentence = Sentence::new();
        for c in text.chars() {
            sentence.append_char(c);
        }
        prop_assert_eq!(sentence.is_finished(), text.ends_with('\n'));
        prop_assert_eq!(sentence.is_empty(), text.is_empty());
    }

    #[test]
    fn trimmed_sentence_has_no_surrounding_whitespace(text in "[ \t]{0,3}[a-z]{0,8}[ \t\n]{0,3}") {
        let mut sentence = Sentence::from(text.as_str());
        sentence.trim();
        prop_assert_eq!(sentence.as_str(), text.trim());
    }
}
