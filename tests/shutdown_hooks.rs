// tests/shutdown_hooks.rs
#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use proc_interact::{Command, ProcessExecutor, ShutdownHooks};
use proc_interact_test_utils::scripts::long_sleep;
use proc_interact_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// An execution whose hook was removed survives a shutdown.
#[tokio::test]
async fn removed_hook_is_not_invoked() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();
    let hooks = executor.shutdown_hooks();

    let execution = executor.spawn_command(&long_sleep())?;
    executor.remove_shutdown_hook(&execution);

    assert_eq!(hooks.run_hooks(), 0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(execution.is_running(), "process must not have been terminated");

    execution.terminate();
    with_timeout(execution.wait_for_exit()).await;
    Ok(())
}

/// A still-registered execution is terminated exactly once.
#[tokio::test]
async fn registered_hook_terminates_exactly_once() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();
    let hooks = executor.shutdown_hooks();

    let execution = executor.spawn_command(&long_sleep())?;
    assert_eq!(hooks.len(), 1);

    assert_eq!(hooks.run_hooks(), 1);
    let code = with_timeout(execution.wait_for_exit()).await;
    assert_eq!(code, 128 + 9);

    assert!(hooks.is_empty());
    assert_eq!(hooks.run_hooks(), 0, "hooks fire at most once");
    Ok(())
}

#[tokio::test]
async fn registering_twice_keeps_one_hook() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();
    let hooks = ShutdownHooks::new();

    let execution = executor.spawn_command(&long_sleep())?;
    hooks.add_hook_for(&execution);
    hooks.add_hook_for(&execution);
    assert_eq!(hooks.len(), 1);

    assert!(hooks.remove_hook_for(&execution));
    assert!(!hooks.remove_hook_for(&execution));

    execution.terminate();
    with_timeout(execution.wait_for_exit()).await;
    Ok(())
}

/// Hooks hold weak references: a dropped execution is skipped.
#[tokio::test]
async fn dropped_execution_is_skipped() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();
    let hooks = ShutdownHooks::new();

    let execution = with_timeout(executor.execute_command(&Command::new("true"))).await?;
    hooks.add_hook_for(&execution);
    drop(execution);

    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks.run_hooks(), 0);
    Ok(())
}

/// Spawned executions leave the registry once their process has exited, so
/// a host that keeps spawning does not accumulate hooks.
#[tokio::test]
async fn exited_spawns_leave_the_registry() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();
    let hooks = executor.shutdown_hooks();

    for _ in 0..20 {
        let execution = executor.spawn_command(&Command::new("true"))?;
        assert_eq!(with_timeout(execution.wait_for_exit()).await, 0);
    }

    let drained = executor
        .schedule_until_true(
            move || {
                let hooks = Arc::clone(&hooks);
                async move { Ok::<_, anyhow::Error>(hooks.is_empty()) }
            },
            Duration::from_secs(2),
            Duration::from_millis(10),
        )
        .await?;

    assert!(drained, "hooks left: {}", executor.shutdown_hooks().len());
    Ok(())
}

/// `execute` only holds a hook while the call is in flight.
#[tokio::test]
async fn execute_leaves_no_hook_behind() -> TestResult {
    init_tracing();
    let executor = ProcessExecutor::new();

    with_timeout(executor.execute_command(&Command::new("true"))).await?;

    assert!(executor.shutdown_hooks().is_empty());
    Ok(())
}
