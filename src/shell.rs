//! Shell command execution with live-streamed output.
//!
//! A [`Command`] is a batch of literal shell lines plus an interpreter choice
//! and a privilege flag. [`SystemShell`] runs each line as its own child
//! process and forwards every stdout/stderr line to the configured callbacks
//! the moment it is produced, instead of buffering until the process exits.
//! Both pipes are drained concurrently so a chatty child can never stall on a
//! full pipe buffer while only the other stream is being read.

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process;

/// Interpreter used when a command does not name one.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Callback receiving a single line of text (a command echo or output line).
pub type PrintFn = Arc<dyn Fn(&str) + Send + Sync>;

/// A batch of shell command lines to execute in a given interpreter.
///
/// Shared value type: a step uses one `Command` for installation and another
/// for rollback. `root` requests privilege escalation, applied per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Command {
    pub run: Vec<String>,
    pub shell: String,
    pub root: bool,
}

/// Failure of a single command line, or of a whole batch.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("while executing `{line}`: {source}")]
    Io {
        line: String,
        #[source]
        source: std::io::Error,
    },

    #[error("while executing `{line}`: command failed (exit code: {code:?})")]
    CommandFailed { line: String, code: Option<i32> },

    #[error("{}", messages.join(",\n"))]
    Aggregate { messages: Vec<String> },
}

/// Gives the ability to run shell command batches.
pub trait Shell {
    /// Execute every line of `command` in order.
    ///
    /// With `stop_on_error` set, the first failing line aborts the batch and
    /// its error is returned as-is. Otherwise every line is attempted and any
    /// failures are aggregated into a single [`ExecError::Aggregate`].
    fn exec(&self, command: &Command, stop_on_error: bool) -> Result<(), ExecError>;
}

fn runtime() -> &'static tokio::runtime::Runtime {
    static RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RT.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_io()
            .build()
            .expect("failed to build tokio runtime for shell execution")
    })
}

/// Production [`Shell`] backed by real child processes.
pub struct SystemShell {
    print_cmd: PrintFn,
    print_out: PrintFn,
    print_err: PrintFn,
    // Probed at most once per shell instance.
    sudo_available: OnceLock<bool>,
}

impl SystemShell {
    /// Create a shell wired to the given command/output/error callbacks.
    pub fn new(print_cmd: PrintFn, print_out: PrintFn, print_err: PrintFn) -> Self {
        Self {
            print_cmd,
            print_out,
            print_err,
            sudo_available: OnceLock::new(),
        }
    }

    /// Build the child process for one line, escalating privilege on demand.
    ///
    /// Escalation prefers `sudo` when it resolves on `PATH` and falls back to
    /// `su` otherwise.
    fn build_command(&self, interpreter: &str, line: &str, root: bool) -> process::Command {
        if !root {
            let mut cmd = process::Command::new(interpreter);
            cmd.args(["-c", line]);
            return cmd;
        }

        if self.sudo_available() {
            let mut cmd = process::Command::new("sudo");
            cmd.args([interpreter, "-c", line]);
            cmd
        } else {
            let mut cmd = process::Command::new("su");
            cmd.args(["-s", interpreter, "-c", line]);
            cmd
        }
    }

    fn sudo_available(&self) -> bool {
        *self
            .sudo_available
            .get_or_init(|| which::which("sudo").is_ok())
    }

    /// Run one line to completion, streaming its output.
    fn run_streamed(&self, mut cmd: process::Command, line: &str) -> Result<(), ExecError> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let print_out = Arc::clone(&self.print_out);
        let print_err = Arc::clone(&self.print_err);

        runtime().block_on(async move {
            let mut child = cmd.spawn().map_err(|source| ExecError::Io {
                line: line.to_owned(),
                source,
            })?;

            let stdout = child.stdout.take().ok_or_else(|| missing_pipe(line))?;
            let stderr = child.stderr.take().ok_or_else(|| missing_pipe(line))?;

            // One reader per pipe, running concurrently with each other and
            // with the wait below.
            let out_reader = tokio::spawn(forward_lines(stdout, print_out));
            let err_reader = tokio::spawn(forward_lines(stderr, print_err));

            let status = child.wait().await.map_err(|source| ExecError::Io {
                line: line.to_owned(),
                source,
            })?;

            // Join the readers so every produced line has been observed
            // before the line counts as finished.
            let _ = out_reader.await;
            let _ = err_reader.await;

            if !status.success() {
                return Err(ExecError::CommandFailed {
                    line: line.to_owned(),
                    code: status.code(),
                });
            }

            Ok(())
        })
    }
}

impl Shell for SystemShell {
    fn exec(&self, command: &Command, stop_on_error: bool) -> Result<(), ExecError> {
        let interpreter = if command.shell.is_empty() {
            DEFAULT_SHELL
        } else {
            command.shell.as_str()
        };

        let mut failures: Vec<String> = Vec::new();

        for line in &command.run {
            let prefix = if command.root { "$ " } else { "" };
            (self.print_cmd)(&format!("{prefix}{line}"));

            let cmd = self.build_command(interpreter, line, command.root);

            if let Err(err) = self.run_streamed(cmd, line) {
                if stop_on_error {
                    return Err(err);
                }

                failures.push(err.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExecError::Aggregate { messages: failures })
        }
    }
}

fn missing_pipe(line: &str) -> ExecError {
    ExecError::Io {
        line: line.to_owned(),
        source: std::io::Error::other("child process pipe was not captured"),
    }
}

async fn forward_lines<R>(reader: R, print: PrintFn)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        print(&line);
    }
}
