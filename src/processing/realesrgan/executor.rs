//! Supervision of the external upscaler process.
//!
//! One invocation per raster image. Both output streams are read as they
//! arrive and forwarded line by line to the progress sink; the executor never
//! touches the output file except to check that it exists afterwards.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::ProgressSink;
use crate::utils::file_exists;
use crate::worker::{TaskError, TaskResult};

use super::types::{ProcessResult, StderrTail};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Launches and supervises the upscaling executable.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    /// Arguments placed before the per-task arguments (launcher or interpreter)
    leading_args: Vec<OsString>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

enum Exit {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            working_dir: None,
            timeout: None,
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the working directory. Defaults to the program's own
    /// directory, where the upscaler looks for its `models/` folder.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn working_dir(&self) -> Option<&Path> {
        self.working_dir
            .as_deref()
            .or_else(|| self.program.parent())
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    fn command(&self, args: &[OsString]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = self.working_dir() {
            cmd.current_dir(dir);
        }

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        cmd
    }

    /// Runs the upscaler once and reports how it ended.
    ///
    /// A non-zero exit or a timeout is a result, not an error; only a failure
    /// to launch (`Spawn`) or cancellation produce `Err`.
    pub async fn run(
        &self,
        args: &[OsString],
        sink: &ProgressSink,
        cancel: &CancellationToken,
    ) -> TaskResult<ProcessResult> {
        debug!("Spawning {} with {} arguments", self.program.display(), args.len());

        let mut child = self.command(args).spawn().map_err(|e| TaskError::Spawn {
            program: self.program.display().to_string(),
            reason: e.to_string(),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TaskError::io("Upscaler stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TaskError::io("Upscaler stderr was not captured"))?;

        let mut stdout = BufReader::new(stdout).split(b'\n');
        let mut stderr = BufReader::new(stderr).split(b'\n');
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut tail = StderrTail::default();

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let timeout = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timeout);

        let exit = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Exit::Cancelled,
                _ = &mut timeout => break Exit::TimedOut,
                segment = stdout.next_segment(), if stdout_open => match segment {
                    Ok(Some(bytes)) => sink.write(decode_line(&bytes)),
                    Ok(None) => stdout_open = false,
                    Err(e) => {
                        warn!("Failed to read upscaler stdout: {}", e);
                        stdout_open = false;
                    }
                },
                segment = stderr.next_segment(), if stderr_open => match segment {
                    Ok(Some(bytes)) => {
                        let line = decode_line(&bytes);
                        tail.push(&line);
                        sink.write(line);
                    }
                    Ok(None) => stderr_open = false,
                    Err(e) => {
                        warn!("Failed to read upscaler stderr: {}", e);
                        stderr_open = false;
                    }
                },
                status = child.wait(), if !stdout_open && !stderr_open => {
                    break Exit::Exited(status?);
                }
            }
        };

        match exit {
            Exit::Exited(status) => {
                let exit_code = normalize_exit(status);
                debug!("Upscaler exited with code {}", exit_code);
                Ok(ProcessResult {
                    exit_code,
                    timed_out: false,
                    stderr_tail: tail.into_vec(),
                })
            }
            Exit::TimedOut => {
                warn!("Upscaler timed out, killing process");
                let exit_code = kill(&mut child).await;
                Ok(ProcessResult {
                    exit_code,
                    timed_out: true,
                    stderr_tail: tail.into_vec(),
                })
            }
            Exit::Cancelled => {
                debug!("Run cancelled, killing upscaler");
                kill(&mut child).await;
                Err(TaskError::Cancelled)
            }
        }
    }

    /// Runs the upscaler and requires a clean exit plus an output file at
    /// `expected_output`.
    pub async fn execute(
        &self,
        args: &[OsString],
        expected_output: &Path,
        sink: &ProgressSink,
        cancel: &CancellationToken,
    ) -> TaskResult<()> {
        let result = self.run(args, sink, cancel).await?;

        if !result.success() {
            return Err(if result.timed_out {
                TaskError::Timeout(self.timeout.unwrap_or_default())
            } else {
                TaskError::ProcessFailure {
                    exit_code: result.exit_code,
                    diagnostics: result.stderr_tail,
                }
            });
        }
        if !file_exists(expected_output).await {
            return Err(TaskError::MissingOutput(expected_output.to_path_buf()));
        }

        Ok(())
    }
}

async fn kill(child: &mut tokio::process::Child) -> i32 {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill upscaler: {}", e);
    }
    match child.try_wait() {
        Ok(Some(status)) => normalize_exit(status),
        _ => -1,
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Exit code of a finished process; signals map to `128 + signal`.
pub fn normalize_exit(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            code
        } else if let Some(sig) = status.signal() {
            128 + sig
        } else {
            1
        }
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}
