// src/exec/launch.rs

//! Spawning OS processes and merging their output streams.

use std::collections::HashMap;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::command::Command;
use crate::errors::{ProcessError, Result};
use crate::exec::ProcessExecution;

const PUMP_BUFFER_SIZE: usize = 4096;
const MERGED_CHANNEL_CAPACITY: usize = 64;

/// A freshly started process together with its merged stdout/stderr.
pub(crate) struct Launched {
    pub execution: Arc<ProcessExecution>,
    pub output: MergedOutput,
}

/// Start `command` with `environment` merged into the inherited
/// environment.
///
/// stdout and stderr are both piped and forwarded into one channel, stdin
/// is piped. A background waiter records the exit code on the execution
/// and kills the child when [`ProcessExecution::terminate`] is called.
pub(crate) fn launch(
    command: &Command,
    environment: &HashMap<String, String>,
    runtime: &Handle,
) -> Result<Launched> {
    // Child reaping needs the runtime's process driver in context.
    let _guard = runtime.enter();

    let mut cmd = tokio::process::Command::new(command.program());
    cmd.args(command.args_slice())
        .envs(environment)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| ProcessError::Launch {
        command: command.to_string(),
        source,
    })?;

    let pid = child.id().unwrap_or_default();
    info!(pid, cmd = %command, "started process");

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let execution = Arc::new(ProcessExecution::new(pid, command.clone(), stdin));

    let (tx, rx) = mpsc::channel(MERGED_CHANNEL_CAPACITY);
    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = stdout {
        pumps.push(runtime.spawn(pump(stdout, tx.clone(), pid, "stdout")).abort_handle());
    }
    if let Some(stderr) = stderr {
        pumps.push(runtime.spawn(pump(stderr, tx, pid, "stderr")).abort_handle());
    }
    execution.attach_pumps(pumps);

    runtime.spawn(wait_for_child(child, Arc::clone(&execution)));

    Ok(Launched {
        execution,
        output: MergedOutput::new(rx),
    })
}

/// Wait for the child to exit, killing it first if termination is
/// requested, then publish the exit code.
async fn wait_for_child(mut child: Child, execution: Arc<ProcessExecution>) {
    let pid = execution.process_id();

    let status = tokio::select! {
        status = child.wait() => status,
        _ = execution.kill_requested() => {
            if let Err(e) = child.start_kill() {
                debug!(pid, error = %e, "kill request failed; process may already be gone");
            }
            child.wait().await
        }
    };

    let code = match status {
        Ok(status) => exit_code_of(status),
        Err(e) => {
            warn!(pid, error = %e, "waiting for process failed");
            -1
        }
    };

    info!(pid, exit_code = code, "process exited");
    execution.record_exit(code);
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Forward everything read from `reader` into the merged channel.
///
/// A read error is forwarded once and ends the pump; the consumer treats it
/// as end of stream.
async fn pump<R>(mut reader: R, tx: mpsc::Sender<io::Result<Vec<u8>>>, pid: u32, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; PUMP_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).await.is_err() {
                    trace!(pid, stream, "output consumer gone; stopping pump");
                    break;
                }
            }
            Err(e) => {
                debug!(pid, stream, error = %e, "reading process output failed");
                let _ = tx.send(Err(e)).await;
                break;
            }
        }
    }
    trace!(pid, stream, "pump finished");
}

/// Merged stdout/stderr of one process, read one character at a time.
///
/// Chunks are buffered internally; characters are decoded as UTF-8 and
/// invalid sequences become U+FFFD.
pub(crate) struct MergedOutput {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    buf: Vec<u8>,
    pos: usize,
}

impl MergedOutput {
    fn new(rx: mpsc::Receiver<io::Result<Vec<u8>>>) -> Self {
        Self {
            rx,
            buf: Vec::new(),
            pos: 0,
        }
    }

    /// Next byte, or `None` once both streams are closed.
    ///
    /// Cancel safe: no state changes before the inner `recv` completes.
    async fn next_byte(&mut self) -> io::Result<Option<u8>> {
        while self.pos >= self.buf.len() {
            match self.rx.recv().await {
                Some(Ok(chunk)) => {
                    self.buf = chunk;
                    self.pos = 0;
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(None),
            }
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    pub(crate) async fn next_char(&mut self) -> io::Result<Option<char>> {
        let Some(first) = self.next_byte().await? else {
            return Ok(None);
        };
        if first.is_ascii() {
            return Ok(Some(char::from(first)));
        }

        let width = match first {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
        };

        let mut bytes = [first, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            match self.next_byte().await? {
                Some(b) => *slot = b,
                None => return Ok(Some(char::REPLACEMENT_CHARACTER)),
            }
        }

        let decoded = std::str::from_utf8(&bytes[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        Ok(Some(decoded))
    }
}
