//! Engine Runner
//!
//! Spawns one engine subprocess per run, captures its output streams, and
//! enforces the mandatory per-run timeout. The wait is a polling loop, not a
//! blocking `wait()`, so the caller's resource monitor can observe the child
//! right up to exit and a wedged engine is killed instead of hanging the
//! whole batch.

use crate::engine::EngineInvocation;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How long the wait loop sleeps between liveness polls
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors from invoking an engine
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Engine executable failed to start
    #[error("Failed to spawn engine process: {0}")]
    Spawn(#[source] std::io::Error),

    /// Engine ran but exited non-zero
    #[error("Engine exited with code {exit_code}: {stderr}")]
    Invocation {
        /// The child's exit code (-1 if terminated by a signal)
        exit_code: i32,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// Engine exceeded the per-run timeout and was killed
    #[error("Engine timed out after {limit:?} and was killed")]
    Timeout {
        /// The timeout that was exceeded
        limit: Duration,
    },

    /// I/O failure while feeding stdin or draining output
    #[error("I/O error talking to engine process: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything captured from one completed engine run
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Child exit code (-1 if terminated by a signal)
    pub exit_code: i32,
    /// Wall-clock time from spawn to observed exit
    pub wall_time: Duration,
}

/// A running engine subprocess with its output drains
pub struct EngineProcess {
    child: Child,
    stdout_drain: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr_drain: JoinHandle<std::io::Result<Vec<u8>>>,
    started: Instant,
}

impl EngineProcess {
    /// Spawn the invocation with piped stdio. The stdin script, if any, is
    /// written and the handle closed before this returns, so engines that
    /// read to EOF start executing immediately.
    pub fn spawn(invocation: &EngineInvocation) -> Result<Self, RunnerError> {
        tracing::debug!(
            program = %invocation.program.display(),
            args = ?invocation.args,
            "spawning engine"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(if invocation.stdin_script.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(RunnerError::Spawn)?;
        let started = Instant::now();

        if let Some(script) = &invocation.stdin_script {
            // Scope drops the handle, closing the pipe. A broken pipe means
            // the child already exited; its exit status carries the real
            // failure, so don't mask it with an I/O error here.
            if let Some(mut stdin) = child.stdin.take() {
                match stdin.write_all(script.as_bytes()) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(e) => return Err(RunnerError::Io(e)),
                }
            }
        }

        // Drain both pipes on their own threads; reading them from the wait
        // loop could deadlock once a pipe buffer fills.
        let stdout_drain = spawn_drain(child.stdout.take());
        let stderr_drain = spawn_drain(child.stderr.take());

        Ok(Self {
            child,
            stdout_drain,
            stderr_drain,
            started,
        })
    }

    /// OS process id of the child, for the resource monitor
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Poll until the child exits or the timeout expires.
    ///
    /// On timeout the child is killed and reaped before the error returns;
    /// the run is recorded as failed, never retried here. A normal exit
    /// (zero or not) yields the captured output - classifying a non-zero
    /// exit is the caller's decision via [`RunOutput::check_status`].
    pub fn wait(mut self, timeout: Duration) -> Result<RunOutput, RunnerError> {
        let deadline = self.started + timeout;

        let status = loop {
            match self.child.try_wait()? {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        self.child.kill().ok();
                        self.child.wait().ok();
                        // Drains finish once the pipes close
                        join_drain(self.stdout_drain).ok();
                        join_drain(self.stderr_drain).ok();
                        return Err(RunnerError::Timeout { limit: timeout });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let wall_time = self.started.elapsed();
        let stdout = join_drain(self.stdout_drain)?;
        let stderr = join_drain(self.stderr_drain)?;

        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code: status.code().unwrap_or(-1),
            wall_time,
        })
    }
}

impl RunOutput {
    /// Classify a non-zero exit as an invocation error with its stderr
    pub fn check_status(&self) -> Result<(), RunnerError> {
        if self.exit_code == 0 {
            Ok(())
        } else {
            Err(RunnerError::Invocation {
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

fn spawn_drain<R: Read + Send + 'static>(
    source: Option<R>,
) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut source) = source {
            source.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_drain(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>, RunnerError> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(RunnerError::Io(std::io::Error::other(
            "output drain thread panicked",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(unix)]
    fn sh(script: &str) -> EngineInvocation {
        EngineInvocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            stdin_script: None,
        }
    }

    #[cfg(unix)]
    #[test]
    fn captures_both_streams_and_exit_code() {
        let proc = EngineProcess::spawn(&sh("echo out; echo err >&2; exit 0")).unwrap();
        let output = proc.wait(Duration::from_secs(5)).unwrap();

        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(output.check_status().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_classifies_as_invocation_error() {
        let proc = EngineProcess::spawn(&sh("echo boom >&2; exit 3")).unwrap();
        let output = proc.wait(Duration::from_secs(5)).unwrap();

        assert_eq!(output.exit_code, 3);
        match output.check_status() {
            Err(RunnerError::Invocation { exit_code, stderr }) => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected invocation error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn wedged_process_is_killed_on_timeout() {
        let proc = EngineProcess::spawn(&sh("sleep 30")).unwrap();
        let started = Instant::now();
        let result = proc.wait(Duration::from_millis(200));

        assert!(matches!(result, Err(RunnerError::Timeout { .. })));
        // Killed promptly, not after the full sleep
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn stdin_script_reaches_the_child() {
        let inv = EngineInvocation {
            program: PathBuf::from("/bin/cat"),
            args: vec![],
            stdin_script: Some("hello from stdin\n".to_string()),
        };
        let proc = EngineProcess::spawn(&inv).unwrap();
        let output = proc.wait(Duration::from_secs(5)).unwrap();

        assert_eq!(output.stdout, "hello from stdin\n");
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let inv = EngineInvocation {
            program: PathBuf::from("/nonexistent/engine-binary"),
            args: vec![],
            stdin_script: None,
        };
        assert!(matches!(
            EngineProcess::spawn(&inv),
            Err(RunnerError::Spawn(_))
        ));
    }
}
