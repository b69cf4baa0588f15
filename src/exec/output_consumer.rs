// src/exec/output_consumer.rs

//! The read / match / reply loop run against every spawned process.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::exec::ProcessExecution;
use crate::exec::launch::MergedOutput;
use crate::interaction::{ProcessInteraction, Sentence};

/// Consume the merged output of `execution`, turning it into sentences and
/// driving `interaction`'s reply protocol.
///
/// Consumption ends when the output stream closes or the execution is
/// marked finished, whichever comes first. Read and reply failures end
/// consumption like a closed stream; the sentences captured so far are
/// kept. Returns the same execution once stdin has been closed.
pub(crate) async fn consume_output<I>(
    execution: Arc<ProcessExecution>,
    mut output: MergedOutput,
    interaction: I,
) -> Arc<ProcessExecution>
where
    I: ProcessInteraction,
{
    let pid = execution.process_id();

    if !interaction.requires_input_interaction() {
        execution.close_stdin().await;
    }

    let mut finished = execution.subscribe_finished();
    let mut sentence = Sentence::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = finished.wait_for(|f| *f) => {
                debug!(pid, "execution marked finished; stopping output consumption");
                break;
            }
            next = output.next_char() => next,
        };

        let c = match next {
            Ok(Some(c)) => c,
            Ok(None) => break,
            Err(e) => {
                debug!(pid, error = %e, "reading process output failed; treating as end of stream");
                break;
            }
        };

        sentence.append_char(c);

        let answer = interaction.replies_to(&sentence);
        sentence.append_answer(&answer);
        if let Err(e) = answer.reply(&execution).await {
            warn!(pid, error = %e, "failed to reply to process; stopping output consumption");
            break;
        }

        if sentence.is_finished() {
            sentence.trim();
            flush(&execution, &interaction, &sentence);
            sentence.reset();
        }

        if execution.is_marked_as_finished() {
            debug!(pid, "execution marked finished by interaction");
            break;
        }
    }

    if !sentence.is_empty() {
        sentence.trim();
        flush(&execution, &interaction, &sentence);
    }

    execution.close_stdin().await;
    trace!(pid, sentences = execution.output().len(), "output consumption finished");

    execution
}

fn flush<I>(execution: &ProcessExecution, interaction: &I, sentence: &Sentence)
where
    I: ProcessInteraction,
{
    let pid = execution.process_id();
    trace!(pid, "{}", sentence);

    if interaction.should_output(sentence) {
        println!("({pid}):{sentence}");
    }
    if interaction.should_output_to_err(sentence) {
        eprintln!("ERROR ({pid}):{sentence}");
    }

    execution.append_output(sentence.as_str());
}
