// src/exec/executor.rs

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, trace, warn};

use crate::command::Command;
use crate::config::ConfigFile;
use crate::errors::{ProcessError, Result};
use crate::exec::countdown::CountdownWatch;
use crate::exec::launch::{Launched, launch};
use crate::exec::output_consumer::consume_output;
use crate::exec::shutdown::ShutdownHooks;
use crate::exec::ProcessExecution;
use crate::interaction::{NoInteraction, ProcessInteraction};

/// Facade for running external processes and arbitrary background work.
///
/// All work runs on the Tokio runtime captured at construction:
/// - `spawn` starts a process and returns immediately, output is consumed
///   in the background and the execution is registered with the shutdown
///   hooks;
/// - `execute` waits for both the process exit and the end of output
///   consumption, then releases every stream;
/// - `schedule_until_true` polls a predicate on the runtime's timer.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    runtime: Handle,
    environment: HashMap<String, String>,
    hooks: Arc<ShutdownHooks>,
}

impl ProcessExecutor {
    /// Create an executor bound to the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn new() -> Self {
        Self::with_runtime(Handle::current())
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            runtime,
            environment: HashMap::new(),
            hooks: Arc::new(ShutdownHooks::new()),
        }
    }

    /// Executor on the current runtime with the environment from `cfg`.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut executor = Self::new();
        executor.set_environment(cfg.environment.clone())?;
        Ok(executor)
    }

    /// Replace the environment variables merged into every spawned
    /// process. Every value must be a non-empty string; on error the
    /// previous environment is kept.
    pub fn set_environment<I, K, V>(&mut self, environment: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let environment: HashMap<String, String> = environment
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if let Some((key, _)) = environment.iter().find(|(_, v)| v.is_empty()) {
            return Err(ProcessError::Config(format!(
                "environment variable '{key}' has an empty value; all values must be non-empty strings"
            )));
        }

        debug!(vars = environment.len(), "executor environment replaced");
        self.environment = environment;
        Ok(self)
    }

    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }

    /// Registry of termination hooks for spawned executions.
    pub fn shutdown_hooks(&self) -> Arc<ShutdownHooks> {
        Arc::clone(&self.hooks)
    }

    /// Run `task` on the executor's runtime.
    pub fn submit<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(task)
    }

    /// Run blocking `work` on the runtime's blocking pool.
    pub fn submit_blocking<F, T>(&self, work: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.runtime.spawn_blocking(work)
    }

    /// Start `command` and return its execution immediately.
    ///
    /// Output consumption continues in the background; observe completion
    /// through the execution's exit code, finished flag or
    /// [`ProcessExecution::wait_for_exit`]. Only launch failures are
    /// reported here.
    pub fn spawn<I>(&self, interaction: I, command: &Command) -> Result<Arc<ProcessExecution>>
    where
        I: ProcessInteraction + 'static,
    {
        let Launched { execution, output } = launch(command, &self.environment, &self.runtime)?;

        self.submit(consume_output(Arc::clone(&execution), output, interaction));
        self.hooks.add_hook_for(&execution);

        let hooks = Arc::clone(&self.hooks);
        let exited = Arc::clone(&execution);
        self.submit(async move {
            exited.wait_for_exit().await;
            hooks.remove_hook_for(&exited);
        });

        Ok(execution)
    }

    /// [`spawn`](Self::spawn) with no interaction.
    pub fn spawn_command(&self, command: &Command) -> Result<Arc<ProcessExecution>> {
        self.spawn(NoInteraction, command)
    }

    /// Run `command` to completion.
    ///
    /// Returns once the process has exited and all of its output has been
    /// consumed. Streams are closed and the process is killed as a safety
    /// net on every path, including when this future is dropped before it
    /// completes. A non-zero exit code is reported as
    /// [`ProcessError::Failed`].
    pub async fn execute<I>(&self, interaction: I, command: &Command) -> Result<Arc<ProcessExecution>>
    where
        I: ProcessInteraction + 'static,
    {
        let Launched { execution, output } = launch(command, &self.environment, &self.runtime)?;
        let guard = AbandonOnDrop::new(&self.hooks, &execution);

        let consumer = self.submit(consume_output(Arc::clone(&execution), output, interaction));
        let outcome = await_completion(&execution, consumer, command).await;

        execution.release().await;
        guard.disarm();

        let execution = outcome?;
        if execution.execution_failed() {
            return Err(ProcessError::Failed {
                command: command.to_string(),
                exit_code: execution.exit_code().unwrap_or(-1),
            });
        }
        Ok(execution)
    }

    /// [`execute`](Self::execute) with no interaction.
    pub async fn execute_command(&self, command: &Command) -> Result<Arc<ProcessExecution>> {
        self.execute(NoInteraction, command).await
    }

    /// Evaluate `predicate` every `step` until it returns `true` or
    /// `timeout` has elapsed.
    ///
    /// Each attempt is bounded by the remaining budget rather than the full
    /// timeout, so at most `timeout / step` attempts run. An attempt that
    /// runs out of time counts as "not yet true". Predicate errors and
    /// panics are not retried and surface as [`ProcessError::Execution`].
    pub async fn schedule_until_true<F, Fut>(
        &self,
        mut predicate: F,
        timeout: Duration,
        step: Duration,
    ) -> Result<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        let countdown = CountdownWatch::new(timeout);
        let mut attempt = 0u64;

        while !countdown.is_expired() {
            attempt += 1;
            let check = predicate();
            let mut scheduled = self.submit(async move {
                tokio::time::sleep(step).await;
                check.await
            });

            match tokio::time::timeout(countdown.time_left(), &mut scheduled).await {
                Ok(Ok(Ok(true))) => {
                    debug!(attempt, "scheduled predicate became true");
                    return Ok(true);
                }
                Ok(Ok(Ok(false))) => {
                    trace!(attempt, "scheduled predicate still false");
                }
                Ok(Ok(Err(e))) => {
                    return Err(ProcessError::Execution {
                        context: "scheduled predicate".to_string(),
                        source: e,
                    });
                }
                Ok(Err(join)) => {
                    return Err(ProcessError::Execution {
                        context: "scheduled predicate".to_string(),
                        source: join_error_cause(join),
                    });
                }
                Err(_elapsed) => {
                    scheduled.abort();
                    trace!(attempt, "scheduled predicate attempt timed out");
                }
            }
        }

        info!(attempts = attempt, ?timeout, "scheduled predicate never became true");
        Ok(false)
    }

    /// Stop terminating `execution` on host shutdown.
    pub fn remove_shutdown_hook(&self, execution: &ProcessExecution) -> &Self {
        self.hooks.remove_hook_for(execution);
        self
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps an `execute`d process registered with the shutdown hooks while
/// the call is in flight, and kills it if the call is dropped early.
struct AbandonOnDrop<'a> {
    hooks: &'a ShutdownHooks,
    execution: Option<Arc<ProcessExecution>>,
}

impl<'a> AbandonOnDrop<'a> {
    fn new(hooks: &'a ShutdownHooks, execution: &Arc<ProcessExecution>) -> Self {
        hooks.add_hook_for(execution);
        Self {
            hooks,
            execution: Some(Arc::clone(execution)),
        }
    }

    /// Deregister the hook without touching the process.
    fn disarm(mut self) {
        if let Some(execution) = self.execution.take() {
            self.hooks.remove_hook_for(&execution);
        }
    }
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(execution) = self.execution.take() {
            warn!(
                pid = execution.process_id(),
                cmd = %execution.command(),
                "execute dropped before completion; killing process"
            );
            execution.abandon();
            self.hooks.remove_hook_for(&execution);
        }
    }
}

async fn await_completion(
    execution: &ProcessExecution,
    consumer: JoinHandle<Arc<ProcessExecution>>,
    command: &Command,
) -> Result<Arc<ProcessExecution>> {
    let exit_code = execution.wait_for_exit().await;
    debug!(pid = execution.process_id(), exit_code, "process exited; waiting for output");

    consumer.await.map_err(|join| ProcessError::Execution {
        context: format!("executing `{command}`"),
        source: join_error_cause(join),
    })
}

/// Unwrap a panic payload into its message when possible.
fn join_error_cause(err: JoinError) -> anyhow::Error {
    if err.is_panic() {
        let payload = err.into_panic();
        return anyhow!("task panicked: {}", panic_message(&*payload));
    }
    anyhow::Error::new(err)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
