//! Windows provisioning through PowerShell scripts and `cmd`.
//!
//! Unlike Linux there is no ring key import, no `hab` account check, and no
//! synchronous package install before a service load.

use anyhow::Result;
use hab_common::{OsType, ProvisioningRequest, ServiceDeclaration, service_key_name};

use crate::application::ports::{ProgressReporter, RemoteChannel};
use crate::application::services::executor::RemoteExecutor;
use crate::domain::command::{service_load_command, supervisor_options, with_auth_token_windows};
use crate::domain::error::ProvisionError;
use crate::domain::templates::{windows_install_script, windows_start_script};

use super::{PlatformStrategy, sibling_path};

pub const WINDOWS_INSTALL_SCRIPT: &str = "win_hab_install.ps1";
pub const WINDOWS_START_SCRIPT: &str = "win_hab_start.ps1";

const SERVICE_CONFIG_ROOT: &str = "C:\\hab\\user";
const KEY_CACHE_DIR: &str = "C:\\hab\\cache\\keys";

pub struct WindowsStrategy<'a> {
    req: &'a ProvisioningRequest,
}

impl<'a> WindowsStrategy<'a> {
    #[must_use]
    pub fn new(req: &'a ProvisioningRequest) -> Self {
        Self { req }
    }

    fn token(&self) -> Option<&str> {
        self.req.builder_auth_token.as_deref()
    }

    /// Upload `script` next to the configured script path and run it.
    async fn run_script<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        file_name: &str,
        script: &str,
    ) -> Result<()> {
        let path = sibling_path(exec.script_path(), file_name);
        exec.upload_script(&path, script.as_bytes()).await?;
        exec.run(&format!(
            "powershell -NoProfile -ExecutionPolicy Bypass -File {path}"
        ))
        .await
    }
}

impl PlatformStrategy for WindowsStrategy<'_> {
    fn os(&self) -> OsType {
        OsType::Windows
    }

    fn supports_ring_key(&self) -> bool {
        false
    }

    async fn install_runtime<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<()> {
        let script = windows_install_script(self.req.version.as_deref(), self.req.accept_license);
        self.run_script(exec, WINDOWS_INSTALL_SCRIPT, &script).await
    }

    async fn upload_ring_key<C: RemoteChannel, R: ProgressReporter>(
        &self,
        _exec: &RemoteExecutor<'_, C, R>,
        _content: &str,
    ) -> Result<()> {
        Err(ProvisionError::Configuration(
            "ring key import is not supported on windows hosts".to_string(),
        )
        .into())
    }

    async fn start_supervisor<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<String> {
        let options = supervisor_options(self.req);
        tracing::debug!(options = %options, "starting supervisor service");
        self.run_script(exec, WINDOWS_START_SCRIPT, &windows_start_script(&options))
            .await?;
        Ok(options)
    }

    async fn start_service<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        service: &ServiceDeclaration,
    ) -> Result<()> {
        let dir = format!("{SERVICE_CONFIG_ROOT}\\{}\\config", service.ident.name());
        exec.reporter()
            .step(&format!("Uploading user.toml for service: {}", service.ident));
        exec.run(&format!("if not exist {dir} mkdir {dir}")).await?;
        exec.upload(&format!("{dir}\\user.toml"), service.user_toml.as_bytes())
            .await?;

        if let Some(key) = &service.service_key {
            let key_name = service_key_name(key).map_err(ProvisionError::from)?;
            exec.reporter()
                .step(&format!("Uploading service group key: {key_name}"));
            exec.upload(&format!("{KEY_CACHE_DIR}\\{key_name}.box.key"), key.as_bytes())
                .await?;
        }

        exec.run(&with_auth_token_windows(
            &service_load_command(service),
            self.token(),
        ))
        .await
    }
}
