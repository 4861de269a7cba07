//! Remote executor: runs one command on the host and streams its output.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::ports::{OutputStream, ProgressReporter, RemoteChannel, RemoteProcess};
use crate::domain::error::{ExecFailure, ProvisionError};
use crate::domain::secrets::redact;

/// Wraps a [`RemoteChannel`] for the provisioning steps.
///
/// Every line of remote output is forwarded to the reporter as it arrives.
/// Secrets registered with [`RemoteExecutor::with_secrets`] are redacted from
/// forwarded output, logs, and error messages.
pub struct RemoteExecutor<'a, C, R> {
    channel: &'a C,
    reporter: &'a R,
    secrets: Vec<String>,
}

impl<'a, C: RemoteChannel, R: ProgressReporter> RemoteExecutor<'a, C, R> {
    pub fn new(channel: &'a C, reporter: &'a R) -> Self {
        Self {
            channel,
            reporter,
            secrets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_secrets<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secrets.extend(secrets.into_iter().map(Into::into));
        self
    }

    pub fn reporter(&self) -> &R {
        self.reporter
    }

    pub fn script_path(&self) -> &str {
        self.channel.script_path()
    }

    /// Run `command` to completion.
    ///
    /// Drains stdout and stderr concurrently, then reports the exit status.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Execution`] if the command cannot be started,
    /// the channel fails mid-command, or the command exits non-zero.
    pub async fn run(&self, command: &str) -> Result<()> {
        let shown = self.redact(command);
        tracing::debug!(command = %shown, "starting remote command");

        let RemoteProcess {
            stdout,
            stderr,
            exit,
        } = self
            .channel
            .start(command)
            .await
            .map_err(|e| self.transport_error(&shown, &e))?;

        let (out, err, status) = tokio::join!(self.drain(stdout), self.drain(stderr), exit);
        let outcome = status.map_err(|e| self.transport_error(&shown, &e))?;
        for drained in [out, err] {
            drained.map_err(|e| self.transport_error(&shown, &anyhow::Error::from(e)))?;
        }

        tracing::debug!(command = %shown, code = ?outcome.code, "remote command exited");
        if outcome.success() {
            return Ok(());
        }
        let failure = outcome
            .code
            .map_or(ExecFailure::NoExitCode, ExecFailure::ExitCode);
        Err(ProvisionError::Execution {
            command: shown,
            failure,
        }
        .into())
    }

    /// Upload `content` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Upload`] if the transfer fails.
    pub async fn upload(&self, destination: &str, content: &[u8]) -> Result<()> {
        tracing::debug!(destination, bytes = content.len(), "uploading file");
        self.channel
            .upload(destination, content)
            .await
            .map_err(|e| self.upload_error(destination, &e))
    }

    /// Upload an interpreter script to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Upload`] if the transfer fails.
    pub async fn upload_script(&self, destination: &str, content: &[u8]) -> Result<()> {
        tracing::debug!(destination, bytes = content.len(), "uploading script");
        self.channel
            .upload_script(destination, content)
            .await
            .map_err(|e| self.upload_error(destination, &e))
    }

    async fn drain(&self, stream: OutputStream) -> std::io::Result<()> {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            self.reporter
                .output(&self.redact(line.trim_end_matches(['\r', '\n'])));
        }
    }

    fn redact(&self, text: &str) -> String {
        redact(text, &self.secrets)
    }

    fn transport_error(&self, command: &str, err: &anyhow::Error) -> anyhow::Error {
        ProvisionError::Execution {
            command: command.to_string(),
            failure: ExecFailure::Transport(self.redact(&format!("{err:#}"))),
        }
        .into()
    }

    fn upload_error(&self, destination: &str, err: &anyhow::Error) -> anyhow::Error {
        ProvisionError::Upload {
            destination: destination.to_string(),
            reason: self.redact(&format!("{err:#}")),
        }
        .into()
    }
}
