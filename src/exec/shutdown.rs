// src/exec/shutdown.rs

//! Registry tying spawned processes to the lifetime of the host process.
//!
//! Every execution started through [`crate::exec::ProcessExecutor::spawn`]
//! is registered here. When the host receives Ctrl-C (or SIGTERM on Unix),
//! [`ShutdownHooks::listen_for_shutdown`] terminates every execution that
//! is still registered and alive. Entries only hold weak references, so
//! the registry never keeps a finished execution alive.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::{ExecutionId, ProcessExecution};

#[derive(Debug, Default)]
pub struct ShutdownHooks {
    hooks: Mutex<HashMap<ExecutionId, Weak<ProcessExecution>>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a termination hook for `execution`. Registering the same
    /// execution twice keeps a single hook.
    ///
    /// Hooks of executions that have since been dropped are pruned here.
    pub fn add_hook_for(&self, execution: &Arc<ProcessExecution>) {
        debug!(id = %execution.id(), pid = execution.process_id(), "registering shutdown hook");
        let mut hooks = self.lock();
        hooks.retain(|_, hook| hook.strong_count() > 0);
        hooks.insert(execution.id(), Arc::downgrade(execution));
    }

    /// Deregister the hook without invoking it. Returns whether a hook was
    /// registered.
    pub fn remove_hook_for(&self, execution: &ProcessExecution) -> bool {
        let removed = self.lock().remove(&execution.id()).is_some();
        debug!(id = %execution.id(), removed, "removing shutdown hook");
        removed
    }

    pub fn contains(&self, execution: &ProcessExecution) -> bool {
        self.lock().contains_key(&execution.id())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Fire every registered hook once and clear the registry.
    ///
    /// Returns the number of executions that were still alive and got a
    /// termination request.
    pub fn run_hooks(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();

        let mut terminated = 0;
        for (id, hook) in drained {
            if let Some(execution) = hook.upgrade() {
                debug!(%id, pid = execution.process_id(), "shutdown hook terminating process");
                execution.terminate();
                terminated += 1;
            }
        }
        terminated
    }

    /// Spawn a task that waits for a shutdown signal and then runs all
    /// hooks.
    pub fn listen_for_shutdown(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            let terminated = self.run_hooks();
            info!(terminated, "shutdown signal received; terminated spawned processes");
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ExecutionId, Weak<ProcessExecution>>> {
        self.hooks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGTERM; only Ctrl+C will trigger shutdown hooks");
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
