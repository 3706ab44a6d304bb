use crate::model::InvocationOutcome;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// How to launch the external viewer.
#[derive(Debug, Clone)]
pub(crate) struct ViewerCommand {
    program: String,
    leading_args: Vec<String>,
}

impl ViewerCommand {
    /// Split a command string like `python3 -m mintpy.view` into program and leading args.
    pub(crate) fn parse(cmd: &str) -> Result<Self> {
        let mut parts = cmd.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .context("viewer command must not be empty")?;
        Ok(Self {
            program,
            leading_args: parts.collect(),
        })
    }

    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    /// Run the viewer once with both output streams appended to `log`.
    /// Only failure to hand the log to the child is an error; anything the
    /// viewer itself does wrong is reported through the outcome.
    pub(crate) async fn run(
        &self,
        args: &[String],
        workdir: &Path,
        log: &File,
        timeout: Option<Duration>,
    ) -> Result<InvocationOutcome> {
        let stdout = log.try_clone().context("failed to share log file with viewer")?;
        let stderr = log.try_clone().context("failed to share log file with viewer")?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);

        debug!("executing {cmd:?}");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return Ok(InvocationOutcome::SpawnFailed {
                    message: e.to_string(),
                })
            }
        };

        let status = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(res) => res,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!("failed to kill timed out viewer: {e}");
                    }
                    return Ok(InvocationOutcome::TimedOut);
                }
            },
            None => child.wait().await,
        };

        Ok(match status {
            Ok(status) => InvocationOutcome::Exited {
                code: status.code(),
            },
            Err(e) => InvocationOutcome::SpawnFailed {
                message: format!("waiting for viewer failed: {e}"),
            },
        })
    }
}
