//! Failure classes of a provisioning run.
//!
//! Raised as `anyhow::Error` through the application layer; callers recover
//! the class with `downcast_ref::<ProvisionError>()`.

use std::fmt;

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Terminal failure of a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A single invalid or unsupported setting, found while decoding or when a
    /// step first needs it.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every problem found by up-front validation, reported together.
    #[error("invalid configuration:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    /// The remote channel could not be established within its timeout.
    #[error("could not connect to {target} within {timeout_secs}s: {reason}")]
    Connection {
        target: String,
        timeout_secs: u64,
        reason: String,
    },

    /// A remote command failed to start, failed in transit, or exited non-zero.
    #[error("error executing command {command:?}: {failure}")]
    Execution {
        command: String,
        failure: ExecFailure,
    },

    /// Content could not be transferred to the host.
    #[error("uploading {destination} failed: {reason}")]
    Upload { destination: String, reason: String },
}

impl ProvisionError {
    /// Short stable label (snake_case) for JSON output and logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::Connection { .. } => "connection",
            Self::Execution { .. } => "execution",
            Self::Upload { .. } => "upload",
        }
    }

    /// `true` when the remote command ran to completion and reported failure,
    /// as opposed to a transport fault.
    #[must_use]
    pub fn is_nonzero_exit(&self) -> bool {
        matches!(
            self,
            Self::Execution {
                failure: ExecFailure::ExitCode(_) | ExecFailure::NoExitCode,
                ..
            }
        )
    }
}

impl From<hab_common::ModelError> for ProvisionError {
    fn from(err: hab_common::ModelError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Why a remote command did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecFailure {
    /// The process exited with a non-zero status.
    ExitCode(i32),
    /// The process ended without reporting an exit status (e.g. killed).
    NoExitCode,
    /// The channel failed to start the command or broke mid-command.
    Transport(String),
}

impl fmt::Display for ExecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode(code) => write!(f, "process exited with status {code}"),
            Self::NoExitCode => f.write_str("process exited without a status"),
            Self::Transport(reason) => write!(f, "remote channel failure: {reason}"),
        }
    }
}
