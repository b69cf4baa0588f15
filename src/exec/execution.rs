// src/exec/execution.rs

//! Handle for one spawned OS process.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::futures::Notified;
use tokio::sync::{Mutex as AsyncMutex, Notify, watch};
use tokio::task::AbortHandle;
use tracing::debug;

use crate::command::Command;

/// Process-unique identifier of an execution.
///
/// Unlike OS pids these are never reused, so they are safe to use as map
/// keys for the lifetime of the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionId(u64);

impl ExecutionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live (or finished) record of one spawned process.
///
/// Shared as `Arc<ProcessExecution>` between the caller, the output
/// consumer, the exit waiter and the shutdown hook registry.
///
/// - the output log and the finished flag are written by the output
///   consumer only;
/// - the exit code is written once by the exit waiter;
/// - `terminate` may be called from anywhere, any number of times.
pub struct ProcessExecution {
    id: ExecutionId,
    pid: u32,
    command: Command,
    output: Mutex<Vec<String>>,
    stdin: AsyncMutex<Option<ChildStdin>>,
    finished: watch::Sender<bool>,
    exit: watch::Sender<Option<i32>>,
    kill: Notify,
    pumps: Mutex<Vec<AbortHandle>>,
}

impl ProcessExecution {
    pub(crate) fn new(pid: u32, command: Command, stdin: Option<ChildStdin>) -> Self {
        Self {
            id: ExecutionId::next(),
            pid,
            command,
            output: Mutex::new(Vec::new()),
            stdin: AsyncMutex::new(stdin),
            finished: watch::Sender::new(false),
            exit: watch::Sender::new(None),
            kill: Notify::new(),
            pumps: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> ExecutionId {
        self.id
    }

    pub fn process_id(&self) -> u32 {
        self.pid
    }

    /// Program name (first element of the command).
    pub fn process_name(&self) -> &str {
        self.command.program()
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Snapshot of the completed sentences captured so far.
    pub fn output(&self) -> Vec<String> {
        lock(&self.output).clone()
    }

    pub fn append_output(&self, sentence: impl Into<String>) {
        lock(&self.output).push(sentence.into());
    }

    /// Exit code, or `None` while the process is still running.
    ///
    /// On Unix a process killed by a signal reports `128 + signal`.
    pub fn exit_code(&self) -> Option<i32> {
        *self.exit.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.exit_code().is_none()
    }

    /// True once the process has exited with a non-zero code.
    pub fn execution_failed(&self) -> bool {
        matches!(self.exit_code(), Some(code) if code != 0)
    }

    /// Flag the execution as finished. The output consumer stops reading
    /// as soon as it observes this, even if the process keeps its output
    /// stream open.
    pub fn mark_as_finished(&self) {
        self.finished.send_replace(true);
    }

    pub fn is_marked_as_finished(&self) -> bool {
        *self.finished.borrow()
    }

    /// Wait until the OS process exits and return its exit code.
    pub async fn wait_for_exit(&self) -> i32 {
        let mut rx = self.exit.subscribe();
        let code = match rx.wait_for(Option::is_some).await {
            Ok(code) => *code,
            Err(_) => None,
        };
        code.unwrap_or(-1)
    }

    /// Wait until the process exits or the execution is marked finished,
    /// whichever happens first.
    pub async fn wait_until_finished(&self) {
        let mut finished = self.finished.subscribe();
        tokio::select! {
            _ = self.wait_for_exit() => {}
            _ = finished.wait_for(|f| *f) => {}
        }
    }

    /// Write `text` to the process's stdin and flush it.
    pub async fn write_input(&self, text: &str) -> io::Result<()> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "process stdin is closed")
        })?;
        stdin.write_all(text.as_bytes()).await?;
        stdin.flush().await
    }

    /// Close stdin. Subsequent calls are no-ops.
    pub async fn close_stdin(&self) {
        if let Some(mut stdin) = self.stdin.lock().await.take() {
            if let Err(e) = stdin.shutdown().await {
                debug!(pid = self.pid, error = %e, "closing process stdin failed");
            }
        }
    }

    /// Request the process to be killed. Best effort and idempotent; a
    /// process that already exited is left alone.
    pub fn terminate(&self) {
        if self.is_running() {
            debug!(pid = self.pid, program = %self.process_name(), "terminating process");
            self.kill.notify_one();
        }
    }

    pub(crate) fn subscribe_finished(&self) -> watch::Receiver<bool> {
        self.finished.subscribe()
    }

    pub(crate) fn kill_requested(&self) -> Notified<'_> {
        self.kill.notified()
    }

    pub(crate) fn record_exit(&self, code: i32) {
        self.exit.send_replace(Some(code));
    }

    pub(crate) fn attach_pumps(&self, handles: Vec<AbortHandle>) {
        lock(&self.pumps).extend(handles);
    }

    /// Close all three standard streams and kill the process if it is
    /// still alive.
    pub(crate) async fn release(&self) {
        self.close_stdin().await;
        self.abandon();
    }

    /// Synchronous part of [`release`](Self::release): stop the output
    /// pumps and kill the process. Stdin is dropped with the consumer once
    /// the merged output closes.
    pub(crate) fn abandon(&self) {
        for pump in lock(&self.pumps).drain(..) {
            pump.abort();
        }
        self.terminate();
    }
}

impl fmt::Debug for ProcessExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessExecution")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("command", &self.command)
            .field("exit_code", &self.exit_code())
            .field("marked_finished", &self.is_marked_as_finished())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
