use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;

use crate::services::error::PipelineError;

/// Captured result of a successful external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs external tools (ffmpeg) on behalf of the media pipeline.
///
/// Implementations must fail with [`PipelineError::Transcode`] on a non-zero
/// exit, carrying stdout and stderr, and with [`PipelineError::Timeout`] when
/// the deadline passes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[OsString],
        timeout: Duration,
    ) -> Result<CommandOutput, PipelineError>;

    /// Check if the tool can be started at all
    async fn health_check(&self, program: &str) -> bool {
        self.run(program, &["-version".into()], Duration::from_secs(10))
            .await
            .is_ok()
    }
}

pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[OsString],
        timeout: Duration,
    ) -> Result<CommandOutput, PipelineError> {
        tracing::debug!(program = program, args = ?args, "Running external command");

        let child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, child).await {
            Err(_) => {
                return Err(PipelineError::Timeout {
                    program: program.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(PipelineError::Storage(anyhow::anyhow!(
                    "{} is not installed or not on PATH",
                    program
                )));
            }
            Ok(res) => res?,
        };

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            tracing::error!("{} failed: {}", program, combined);
            return Err(PipelineError::Transcode {
                program: program.to_string(),
                status: output.status.to_string(),
                output: combined,
            });
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
