//! Per-OS provisioning strategies.
//!
//! The orchestrator selects one [`Platform`] per run and drives it through
//! the fixed step order; each variant owns the command text for its OS.

mod linux;
mod windows;

pub use linux::{LINUX_INSTALL_URL, LinuxStrategy};
pub use windows::{WINDOWS_INSTALL_SCRIPT, WINDOWS_START_SCRIPT, WindowsStrategy};

use anyhow::Result;
use hab_common::{OsType, ProvisioningRequest, ServiceDeclaration};

use crate::application::ports::{ProgressReporter, RemoteChannel};
use crate::application::services::executor::RemoteExecutor;

/// Provisioning steps that differ between target operating systems.
#[allow(async_fn_in_trait)]
pub trait PlatformStrategy {
    fn os(&self) -> OsType;

    /// Whether ring key material can be imported on this OS.
    fn supports_ring_key(&self) -> bool;

    /// Install the runtime and its prerequisites.
    async fn install_runtime<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<()>;

    /// Import the ring key material into the runtime's key cache.
    async fn upload_ring_key<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        content: &str,
    ) -> Result<()>;

    /// Install and start the supervisor. Returns the supervisor options it
    /// was started with.
    async fn start_supervisor<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<String>;

    /// Install, configure, and load one service.
    async fn start_service<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        service: &ServiceDeclaration,
    ) -> Result<()>;
}

/// The strategy selected for a run.
pub enum Platform<'a> {
    Linux(LinuxStrategy<'a>),
    Windows(WindowsStrategy<'a>),
}

impl<'a> Platform<'a> {
    #[must_use]
    pub fn select(os: OsType, request: &'a ProvisioningRequest) -> Self {
        match os {
            OsType::Linux => Self::Linux(LinuxStrategy::new(request)),
            OsType::Windows => Self::Windows(WindowsStrategy::new(request)),
        }
    }
}

impl PlatformStrategy for Platform<'_> {
    fn os(&self) -> OsType {
        match self {
            Self::Linux(s) => s.os(),
            Self::Windows(s) => s.os(),
        }
    }

    fn supports_ring_key(&self) -> bool {
        match self {
            Self::Linux(s) => s.supports_ring_key(),
            Self::Windows(s) => s.supports_ring_key(),
        }
    }

    async fn install_runtime<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<()> {
        match self {
            Self::Linux(s) => s.install_runtime(exec).await,
            Self::Windows(s) => s.install_runtime(exec).await,
        }
    }

    async fn upload_ring_key<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        content: &str,
    ) -> Result<()> {
        match self {
            Self::Linux(s) => s.upload_ring_key(exec, content).await,
            Self::Windows(s) => s.upload_ring_key(exec, content).await,
        }
    }

    async fn start_supervisor<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<String> {
        match self {
            Self::Linux(s) => s.start_supervisor(exec).await,
            Self::Windows(s) => s.start_supervisor(exec).await,
        }
    }

    async fn start_service<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        service: &ServiceDeclaration,
    ) -> Result<()> {
        match self {
            Self::Linux(s) => s.start_service(exec, service).await,
            Self::Windows(s) => s.start_service(exec, service).await,
        }
    }
}

/// Path of `file_name` in the directory holding `script_path`.
///
/// Accepts both `/` and `\` separators; a bare file name resolves to
/// `file_name` itself.
#[must_use]
pub fn sibling_path(script_path: &str, file_name: &str) -> String {
    match script_path.rfind(['/', '\\']) {
        Some(idx) => format!("{}{file_name}", &script_path[..=idx]),
        None => file_name.to_string(),
    }
}
