//! Child-process runner with output capture and an optional timeout.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a running child is polled while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors launching or waiting for an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The executable could not be started (missing binary, permissions).
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// Waiting on the child failed.
    #[error("Failed waiting for {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The child outlived its timeout and was killed.
    #[error("{tool} timed out after {}s", .timeout.as_secs_f64())]
    TimedOut { tool: String, timeout: Duration },
}

/// Captured result of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code (`None` when terminated by a signal).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    fn new(status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code for error messages (-1 for signal termination).
    pub fn code_or_signal(&self) -> i32 {
        self.exit_code.unwrap_or(-1)
    }

    /// stdout followed by stderr, for tools that report on either stream.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// With a timeout, the child is killed once it runs longer than `timeout`
/// and `ToolError::TimedOut` is returned. The child never inherits stdin.
pub fn run_tool(
    tool: &str,
    cmd: &mut Command,
    timeout: Option<Duration>,
) -> Result<ToolOutput, ToolError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    tracing::trace!("Spawning {}: {:?}", tool, cmd);

    let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
        tool: tool.to_string(),
        source,
    })?;

    // Drain both pipes on their own threads so a chatty child can't block
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = match timeout {
        Some(limit) => match wait_with_timeout(&mut child, limit) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                // Readers are left detached: a grandchild may still hold the pipes
                return Err(ToolError::TimedOut {
                    tool: tool.to_string(),
                    timeout: limit,
                });
            }
            Err(source) => {
                return Err(ToolError::Wait {
                    tool: tool.to_string(),
                    source,
                })
            }
        },
        None => child.wait().map_err(|source| ToolError::Wait {
            tool: tool.to_string(),
            source,
        })?,
    };

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    Ok(ToolOutput::new(status, stdout, stderr))
}

/// Poll the child until it exits or `limit` elapses (`Ok(None)`).
fn wait_with_timeout(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= limit {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Render a program and its arguments as a single loggable line.
pub fn format_command(program: &str, args: &[String]) -> String {
    let mut line = quote_arg(program);
    for arg in args {
        line.push(' ');
        line.push_str(&quote_arg(arg));
    }
    line
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
}
