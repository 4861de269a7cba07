//! Seams between the provisioning use case and the outside world: the
//! remote host, local process execution, and the operator's terminal.
//!
//! Nothing here depends on `crate::infra`, `crate::commands` or
//! `crate::output`.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use tokio::io::AsyncRead;

// ── Value Types ───────────────────────────────────────────────────────────────

/// One output stream of a started remote command.
pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Resolves when the remote command exits.
pub type ExitFuture = BoxFuture<'static, Result<ExitOutcome>>;

/// Exit status of a remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code, or `None` when the process ended without one.
    pub code: Option<i32>,
}

impl ExitOutcome {
    #[must_use]
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

/// Handle to a command started on the remote host.
///
/// Both streams must be drained while waiting on `exit`, otherwise a chatty
/// command can block on a full pipe.
pub struct RemoteProcess {
    pub stdout: OutputStream,
    pub stderr: OutputStream,
    pub exit: ExitFuture,
}

// ── Remote Channel Port ───────────────────────────────────────────────────────

/// Remote-execution channel to a single host.
///
/// `connect` is a single attempt; the caller owns the retry budget, bounded
/// by [`RemoteChannel::timeout`].
#[allow(async_fn_in_trait)]
pub trait RemoteChannel {
    /// Human-readable target, e.g. `root@10.0.0.5:22`.
    fn describe(&self) -> String;
    /// Overall budget for establishing the connection.
    fn timeout(&self) -> Duration;
    /// Where interpreter scripts are staged on the host.
    fn script_path(&self) -> &str;
    /// Make one attempt to establish the connection.
    async fn connect(&self) -> Result<()>;
    /// Release the connection.
    async fn disconnect(&self) -> Result<()>;
    /// Start `command` on the host.
    async fn start(&self, command: &str) -> Result<RemoteProcess>;
    /// Write `content` to `destination` on the host.
    async fn upload(&self, destination: &str, content: &[u8]) -> Result<()>;
    /// Write an interpreter script to `destination` on the host.
    async fn upload_script(&self, destination: &str, content: &[u8]) -> Result<()>;
}

// ── Local Command Runner Port ─────────────────────────────────────────────────

/// Runs local programs (the `ssh`/`scp` clients) on behalf of a channel.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `program` to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Fails when `program` cannot start or runs past `timeout`; in the
    /// latter case the process is killed first.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<Output>;
    /// Start `program` with piped stdout and stderr and return at once.
    ///
    /// # Errors
    ///
    /// Fails when `program` cannot start.
    fn spawn(&self, program: &str, args: &[String]) -> Result<tokio::process::Child>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Operator-facing progress sink for a run. Sync; implementations print
/// immediately.
pub trait ProgressReporter {
    /// A step is about to start.
    fn step(&self, message: &str);
    /// A step finished.
    fn success(&self, message: &str);
    /// Something was skipped or degraded without failing the run.
    fn warn(&self, message: &str);
    /// One line of output from a remote command.
    fn output(&self, line: &str);
}
