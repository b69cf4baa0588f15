// tests/spawn.rs
#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use proc_interact::{ProcessExecution, ProcessExecutor, ProcessInteractionBuilder};
use proc_interact_test_utils::scripts::{long_sleep, print_lines, print_then_hang};
use proc_interact_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Poll until the execution's output log holds at least `n` sentences.
async fn wait_for_output(
    executor: &ProcessExecutor,
    execution: &Arc<ProcessExecution>,
    n: usize,
) -> TestResult {
    let watched = Arc::clone(execution);
    let ready = executor
        .schedule_until_true(
            move || {
                let watched = Arc::clone(&watched);
                async move { Ok::<_, anyhow::Error>(watched.output().len() >= n) }
            },
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .await?;
    assert!(ready, "expected at least {n} sentences, got {:?}", execution.output());
    Ok(())
}

/// `spawn` hands back the execution while the process is still running and
/// registers a shutdown hook for it.
#[tokio::test]
async fn spawn_returns_while_process_runs() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();

    let execution = executor.spawn_command(&long_sleep())?;

    assert!(execution.is_running());
    assert!(execution.process_id() > 0);
    assert_eq!(execution.process_name(), "sleep");
    assert!(executor.shutdown_hooks().contains(&execution));

    execution.terminate();
    let code = with_timeout(execution.wait_for_exit()).await;
    assert_eq!(code, 128 + 9, "SIGKILL should be reported as 128 + 9");
    assert!(execution.execution_failed());
    Ok(())
}

#[tokio::test]
async fn spawned_output_is_consumed_in_background() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();

    let execution = executor.spawn_command(&print_lines(&["one", "two"], 0))?;

    assert_eq!(with_timeout(execution.wait_for_exit()).await, 0);
    wait_for_output(&executor, &execution, 2).await?;
    assert_eq!(execution.output(), vec!["one", "two"]);

    executor.remove_shutdown_hook(&execution);
    assert!(!executor.shutdown_hooks().contains(&execution));
    Ok(())
}

/// A process that keeps its output open stops being consumed as soon as the
/// interaction marks it finished.
#[tokio::test]
async fn marking_finished_stops_consumption_without_eof() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();
    let interaction = ProcessInteractionBuilder::new()
        .when("^ready")
        .terminate()
        .build()?;

    let execution = executor.spawn(interaction, &print_then_hang("ready"))?;

    with_timeout(execution.wait_until_finished()).await;
    assert!(execution.is_marked_as_finished());
    assert!(execution.is_running(), "process itself must still be alive");

    wait_for_output(&executor, &execution, 1).await?;
    assert_eq!(execution.output(), vec!["ready"]);

    execution.terminate();
    with_timeout(execution.wait_for_exit()).await;
    Ok(())
}

#[tokio::test]
async fn terminate_is_idempotent() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();

    let execution = executor.spawn_command(&long_sleep())?;
    execution.terminate();
    execution.terminate();

    let code = with_timeout(execution.wait_for_exit()).await;
    execution.terminate();

    assert_eq!(execution.exit_code(), Some(code));
    Ok(())
}
