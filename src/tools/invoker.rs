//! Process invoker
//!
//! Launches cli-vision for one tool call and collects its exit status and
//! output. Never interprets output; classification belongs to the parser.
//!
//! - Argv arrays only, no shell
//! - stdin is closed so the child cannot read the protocol stream
//! - Bounded waits kill and reap the child on expiry
//! - Kill-on-drop, so a cancelled call cannot leak a process

use crate::errors::{AdapterError, Result};
use crate::tools::types::{ExecutionOutcome, InvocationSpec, WaitPolicy};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Hint appended when the cli-vision executable itself is missing
pub const EXECUTABLE_HINT: &str = ". Set CLI_VISION_PATH environment variable.";

/// Runs an `InvocationSpec` under a wait policy
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    async fn invoke(&self, spec: &InvocationSpec, policy: WaitPolicy) -> Result<ExecutionOutcome>;
}

/// Invoker backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SubprocessInvoker;

impl SubprocessInvoker {
    pub fn new() -> Self {
        Self
    }
}

/// Resolve a program the way the OS would: paths must name an existing
/// file, bare names are looked up on `PATH`.
pub fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.as_os_str().is_empty() {
        return None;
    }
    if program.is_absolute() || program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    which::which(program).ok()
}

fn executable_not_found(program: &Path) -> AdapterError {
    AdapterError::NotFound {
        what: "cli-vision".to_string(),
        path: program.display().to_string(),
        hint: EXECUTABLE_HINT.to_string(),
    }
}

#[async_trait]
impl ProcessInvoker for SubprocessInvoker {
    async fn invoke(&self, spec: &InvocationSpec, policy: WaitPolicy) -> Result<ExecutionOutcome> {
        let program = resolve_program(&spec.program).ok_or_else(|| executable_not_found(&spec.program))?;

        if resolve_program(Path::new(&spec.target)).is_none() {
            return Err(AdapterError::NotFound {
                what: "Binary".to_string(),
                path: spec.target.clone(),
                hint: String::new(),
            });
        }

        let mut cmd = Command::new(&program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!("spawning {} ({:?})", spec.command_line(), policy);
        let start = Instant::now();

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => executable_not_found(&spec.program),
            _ => AdapterError::IoError(e),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let collected = match policy {
            WaitPolicy::Delegated => Some(collect_output(&mut child, stdout, stderr).await),
            WaitPolicy::Bounded(limit) => {
                timeout(limit, collect_output(&mut child, stdout, stderr)).await.ok()
            }
        };

        let (status, stdout, stderr) = match collected {
            Some(result) => result?,
            None => {
                warn!(
                    "{} exceeded {:?}, killing pid {:?}",
                    spec.capability.subcommand(),
                    start.elapsed(),
                    child.id()
                );
                if let Err(e) = child.kill().await {
                    warn!("failed to kill timed-out child: {}", e);
                }
                return Ok(ExecutionOutcome {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    policy,
                    timed_out: true,
                });
            }
        };

        debug!(
            "{} exited with {:?} after {}ms ({} bytes stdout, {} bytes stderr)",
            spec.capability.subcommand(),
            status.code(),
            start.elapsed().as_millis(),
            stdout.len(),
            stderr.len()
        );

        Ok(ExecutionOutcome {
            exit_code: status.code(),
            stdout,
            stderr,
            policy,
            timed_out: false,
        })
    }
}

/// Wait for exit while draining both pipes, so a chatty child cannot
/// block on a full pipe buffer.
async fn collect_output<O, E>(
    child: &mut Child,
    stdout: Option<O>,
    stderr: Option<E>,
) -> Result<(ExitStatus, String, String)>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let (status, stdout, stderr) =
        tokio::try_join!(child.wait(), read_lossy(stdout), read_lossy(stderr))?;
    Ok((status, stdout, stderr))
}

async fn read_lossy<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
