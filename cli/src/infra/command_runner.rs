//! Tokio-backed implementation of the `CommandRunner` port.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::application::ports::CommandRunner;

/// Runs the local `ssh` and `scp` clients.
///
/// Children are killed when the timeout fires and whenever their handle is
/// dropped, so an abandoned connection attempt never lingers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

fn command(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Read a captured pipe to the end. A read error truncates the capture.
async fn read_all<P: AsyncRead + Unpin>(pipe: Option<P>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

impl CommandRunner for TokioCommandRunner {
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<Output> {
        let mut child = self.spawn(program, args)?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = async {
            let (status, stdout, stderr) =
                tokio::join!(child.wait(), read_all(stdout), read_all(stderr));
            status.map(|status| Output {
                status,
                stdout,
                stderr,
            })
        };
        let outcome = tokio::time::timeout(timeout, finished).await;
        match outcome {
            Ok(output) => output.with_context(|| format!("waiting for {program}")),
            Err(_) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    fn spawn(&self, program: &str, args: &[String]) -> Result<Child> {
        command(program, args)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))
    }
}
