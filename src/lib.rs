// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod errors;
pub mod exec;
pub mod interaction;
pub mod logging;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, OutputSection, load_and_validate};

pub use crate::command::Command;
pub use crate::errors::{ProcessError, Result as ProcessResult};
pub use crate::exec::{ProcessExecution, ProcessExecutor, ShutdownHooks};
pub use crate::interaction::{
    Answer, NoInteraction, ProcessInteraction, ProcessInteractionBuilder, RegexInteraction,
    Sentence,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - executor + environment
/// - the interaction built from the config
/// - shutdown hooks on Ctrl-C / SIGTERM
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(path)?,
        None => echo_all_config(),
    };

    let command = Command::try_from(args.command.clone())?;
    let executor = ProcessExecutor::from_config(&cfg)?;
    let interaction = cfg.interaction()?;

    let _shutdown_listener = executor.shutdown_hooks().listen_for_shutdown();

    if args.spawn {
        run_spawned(&executor, interaction, &command, &cfg).await
    } else {
        run_executed(&executor, interaction, &command).await
    }
}

/// Config used when no file is given: no replies, echo every line.
fn echo_all_config() -> ConfigFile {
    ConfigFile {
        output: OutputSection {
            stdout: vec![".*".to_string()],
            stderr: Vec::new(),
        },
        ..ConfigFile::default()
    }
}

async fn run_executed(
    executor: &ProcessExecutor,
    interaction: RegexInteraction,
    command: &Command,
) -> Result<()> {
    let execution = executor.execute(interaction, command).await?;
    info!(
        pid = execution.process_id(),
        exit_code = ?execution.exit_code(),
        sentences = execution.output().len(),
        "command finished"
    );
    Ok(())
}

async fn run_spawned(
    executor: &ProcessExecutor,
    interaction: RegexInteraction,
    command: &Command,
    cfg: &ConfigFile,
) -> Result<()> {
    let execution = executor.spawn(interaction, command)?;

    let watched = Arc::clone(&execution);
    let done = executor
        .schedule_until_true(
            move || {
                let watched = Arc::clone(&watched);
                async move { Ok::<_, anyhow::Error>(is_done(&watched)) }
            },
            cfg.schedule.timeout(),
            cfg.schedule.step(),
        )
        .await?;

    if !done {
        warn!(pid = execution.process_id(), "process did not finish in time; terminating");
        execution.terminate();
        execution.wait_for_exit().await;
        return Err(anyhow!(
            "`{command}` did not finish within {:?}",
            cfg.schedule.timeout()
        ));
    }

    if execution.is_running() {
        debug!(pid = execution.process_id(), "interaction finished; terminating process");
        execution.terminate();
        execution.wait_for_exit().await;
        executor.remove_shutdown_hook(&execution);
        return Ok(());
    }

    executor.remove_shutdown_hook(&execution);

    if execution.execution_failed() {
        return Err(ProcessError::Failed {
            command: command.to_string(),
            exit_code: execution.exit_code().unwrap_or(-1),
        }
        .into());
    }

    info!(
        pid = execution.process_id(),
        exit_code = ?execution.exit_code(),
        "spawned command finished"
    );
    Ok(())
}

fn is_done(execution: &ProcessExecution) -> bool {
    !execution.is_running() || execution.is_marked_as_finished()
}
