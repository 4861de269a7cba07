//! OpenSSH-backed implementation of the `RemoteChannel` port.
//!
//! Drives the system `ssh` and `scp` clients. All invocations share one
//! multiplexed master connection whose control socket lives in a private
//! temp directory owned by the channel.

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use hab_common::OsType;

use crate::application::ports::{CommandRunner, ExitOutcome, RemoteChannel, RemoteProcess};
use crate::domain::config::ConnectionSettings;
use crate::infra::command_runner::TokioCommandRunner;

/// Script staging path used when none is configured.
pub const DEFAULT_LINUX_SCRIPT_PATH: &str = "/tmp/hab-provision.sh";
pub const DEFAULT_WINDOWS_SCRIPT_PATH: &str = "C:/Windows/Temp/hab-provision.ps1";

/// `ConnectTimeout` handed to the ssh client for a single attempt.
const ATTEMPT_CONNECT_SECS: u64 = 10;
/// Hard ceiling on a single local `ssh` probe or control command.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(ATTEMPT_CONNECT_SECS + 5);
/// Idle seconds before a master connection exits on its own. Bounds the
/// lifetime of a master that `-O exit` never reached.
const MASTER_IDLE_SECS: u64 = 60;

/// Default script staging path for `os`.
#[must_use]
pub fn default_script_path(os: OsType) -> &'static str {
    match os {
        OsType::Linux => DEFAULT_LINUX_SCRIPT_PATH,
        OsType::Windows => DEFAULT_WINDOWS_SCRIPT_PATH,
    }
}

pub struct SshChannel<R = TokioCommandRunner> {
    runner: R,
    settings: ConnectionSettings,
    script_path: String,
    control_dir: tempfile::TempDir,
}

impl SshChannel<TokioCommandRunner> {
    /// Channel for `settings` using the system ssh client.
    ///
    /// # Errors
    ///
    /// Returns an error if the control socket directory cannot be created.
    pub fn new(settings: ConnectionSettings, os: OsType) -> Result<Self> {
        Self::with_runner(TokioCommandRunner, settings, os)
    }
}

impl<R: CommandRunner> SshChannel<R> {
    /// Channel for `settings` using `runner` to invoke `ssh`/`scp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the control socket directory cannot be created.
    pub fn with_runner(runner: R, settings: ConnectionSettings, os: OsType) -> Result<Self> {
        let control_dir = tempfile::Builder::new()
            .prefix("hab-provision-ssh")
            .tempdir()
            .context("cannot create ssh control directory")?;
        let script_path = settings
            .script_path
            .clone()
            .unwrap_or_else(|| default_script_path(os).to_string());
        Ok(Self {
            runner,
            settings,
            script_path,
            control_dir,
        })
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.settings.user, self.settings.host)
    }

    fn control_path(&self) -> PathBuf {
        self.control_dir.path().join("master.sock")
    }

    /// Options shared by every `ssh` and `scp` invocation.
    fn common_options(&self) -> Vec<String> {
        let mut args = Vec::new();
        for option in [
            "BatchMode=yes".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "ControlMaster=auto".to_string(),
            format!("ControlPath={}", self.control_path().display()),
            format!("ControlPersist={MASTER_IDLE_SECS}"),
            format!("ConnectTimeout={ATTEMPT_CONNECT_SECS}"),
        ] {
            args.push("-o".to_string());
            args.push(option);
        }
        if let Some(key) = &self.settings.private_key {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args
    }

    /// `ssh` arguments targeting the host, followed by `extra`.
    pub(crate) fn ssh_args(&self, extra: &[&str]) -> Vec<String> {
        let mut args = self.common_options();
        args.push("-p".to_string());
        args.push(self.settings.port.to_string());
        args.push(self.destination());
        args.extend(extra.iter().map(|s| (*s).to_string()));
        args
    }

    /// `scp` arguments copying `local` to `remote` on the host.
    pub(crate) fn scp_args(&self, local: &str, remote: &str) -> Vec<String> {
        let mut args = self.common_options();
        args.push("-P".to_string());
        args.push(self.settings.port.to_string());
        args.push(local.to_string());
        args.push(format!("{}:{remote}", self.destination()));
        args
    }

    async fn copy(&self, destination: &str, content: &[u8]) -> Result<()> {
        let mut staged = tempfile::NamedTempFile::new().context("cannot create staging file")?;
        staged
            .write_all(content)
            .and_then(|()| staged.flush())
            .context("cannot write staging file")?;
        let local = staged.path().display().to_string();

        let output = self
            .runner
            .run_with_timeout("scp", &self.scp_args(&local, destination), self.settings.timeout)
            .await?;
        if !output.status.success() {
            anyhow::bail!(
                "scp exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

impl<R: CommandRunner> RemoteChannel for SshChannel<R> {
    fn describe(&self) -> String {
        format!("{}:{}", self.destination(), self.settings.port)
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    fn script_path(&self) -> &str {
        &self.script_path
    }

    async fn connect(&self) -> Result<()> {
        let output = self
            .runner
            .run_with_timeout("ssh", &self.ssh_args(&["true"]), ATTEMPT_TIMEOUT)
            .await?;
        if !output.status.success() {
            anyhow::bail!(
                "ssh exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let output = self
            .runner
            .run_with_timeout("ssh", &self.ssh_args(&["-O", "exit"]), ATTEMPT_TIMEOUT)
            .await?;
        if !output.status.success() {
            anyhow::bail!(
                "closing ssh master connection failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    async fn start(&self, command: &str) -> Result<RemoteProcess> {
        let mut child = self.runner.spawn("ssh", &self.ssh_args(&["--", command]))?;
        let stdout = child.stdout.take().context("ssh stdout not captured")?;
        let stderr = child.stderr.take().context("ssh stderr not captured")?;
        let exit = async move {
            let status = child.wait().await.context("waiting for ssh")?;
            Ok::<_, anyhow::Error>(ExitOutcome {
                code: status.code(),
            })
        }
        .boxed();
        Ok(RemoteProcess {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            exit,
        })
    }

    async fn upload(&self, destination: &str, content: &[u8]) -> Result<()> {
        self.copy(destination, content).await
    }

    async fn upload_script(&self, destination: &str, content: &[u8]) -> Result<()> {
        self.copy(destination, content).await
    }
}
