//! Process-backed line source.
//!
//! Commands are executed through a program prefix, normally
//! `ssh -p 29418 user@host`, and their stdout is read line by line. The child
//! is killed on drop, so a stream that is never closed still releases its
//! session.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::{LineSource, LineStream, TransportError};
use crate::config::SshConfig;

/// Exit status `ssh` reports when the session itself failed.
pub const SSH_CONNECTION_FAILURE: i32 = 255;

/// Default timeout for graceful child termination on close.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Line source that runs each command as a child process.
#[derive(Debug, Clone)]
pub struct ProcessLineSource {
    program: String,
    prefix_args: Vec<String>,
    terminate_timeout: Duration,
}

impl ProcessLineSource {
    /// Create a source running `program prefix_args... <command>`.
    #[must_use]
    pub fn new(program: impl Into<String>, prefix_args: &[&str]) -> Self {
        Self {
            program: program.into(),
            prefix_args: prefix_args.iter().map(|s| (*s).to_string()).collect(),
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
        }
    }

    /// Create a source that runs commands on a Gerrit server over `ssh`.
    #[must_use]
    pub fn ssh(config: &SshConfig) -> Self {
        Self {
            program: "ssh".to_string(),
            prefix_args: build_ssh_args(config),
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
        }
    }

    /// Set how long `close` waits after SIGTERM before killing the child.
    #[must_use]
    pub fn terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    /// Get the program being executed.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the arguments placed before the command.
    #[must_use]
    pub fn prefix_args(&self) -> &[String] {
        &self.prefix_args
    }
}

/// Build the `ssh` argument list for a Gerrit connection.
#[must_use]
pub fn build_ssh_args(config: &SshConfig) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        config.port.to_string(),
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        format!("ConnectTimeout={}", config.connect_timeout_secs),
    ];

    if let Some(key) = &config.key_file {
        args.push("-i".to_string());
        args.push(key.display().to_string());
    }

    match &config.user {
        Some(user) => args.push(format!("{user}@{}", config.host)),
        None => args.push(config.host.clone()),
    }

    args
}

#[async_trait]
impl LineSource for ProcessLineSource {
    async fn open(&self, command: &str) -> Result<Box<dyn LineStream>, TransportError> {
        tracing::debug!(program = %self.program, command = %command, "Opening line stream");

        let mut child = Command::new(&self.program)
            .args(&self.prefix_args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::from_spawn(&self.program, e))?;

        let stdout = child.stdout.take().ok_or(TransportError::NoStdout)?;
        let stderr = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        Ok(Box::new(ProcessLineStream {
            child,
            reader: BufReader::new(stdout),
            buf: Vec::new(),
            stderr,
            finished: false,
            terminate_timeout: self.terminate_timeout,
        }))
    }
}

/// Output stream of a running child process.
#[derive(Debug)]
pub struct ProcessLineStream {
    child: Child,
    reader: BufReader<ChildStdout>,
    buf: Vec<u8>,
    stderr: Option<JoinHandle<String>>,
    finished: bool,
    terminate_timeout: Duration,
}

impl ProcessLineStream {
    async fn collect_stderr(&mut self) -> String {
        match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        }
    }

    async fn finish(&mut self) -> Result<(), TransportError> {
        self.finished = true;
        let status = self.child.wait().await?;
        let stderr = self.collect_stderr().await;
        check_exit(status, stderr)
    }

    /// Attempt graceful termination with a timeout.
    ///
    /// On Unix, sends SIGTERM first, then SIGKILL after the timeout.
    /// On other platforms, falls back to immediate kill.
    async fn graceful_terminate(&mut self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let Some(pid) = self.child.id() else {
                return Ok(());
            };
            let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
            let _ = kill(nix_pid, Signal::SIGTERM);

            match tokio::time::timeout(self.terminate_timeout, self.child.wait()).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(_) => self.child.kill().await,
            }
        }

        #[cfg(not(unix))]
        {
            self.child.kill().await
        }
    }
}

/// Decode one output line without its terminator. Invalid UTF-8 is replaced
/// rather than failing the stream.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(line) => line.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Output line is not valid UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

fn check_exit(status: ExitStatus, stderr: String) -> Result<(), TransportError> {
    if status.code() == Some(SSH_CONNECTION_FAILURE) {
        return Err(TransportError::ConnectionFailed {
            stderr: stderr.trim().to_string(),
        });
    }
    if !status.success() {
        tracing::debug!(status = %status, stderr = %stderr.trim(), "Remote command exited non-zero");
    }
    Ok(())
}

#[async_trait]
impl LineStream for ProcessLineStream {
    async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        if self.finished {
            return Ok(None);
        }
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 {
            return self.finish().await.map(|()| None);
        }
        Ok(Some(decode_line(&self.buf)))
    }

    async fn close(&mut self) {
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::trace!("Terminating remote command");
                if let Err(e) = self.graceful_terminate().await {
                    tracing::warn!(error = %e, "Failed to terminate remote command");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to query remote command status"),
        }
        if let Some(handle) = self.stderr.take() {
            handle.abort();
        }
        self.finished = true;
    }
}
