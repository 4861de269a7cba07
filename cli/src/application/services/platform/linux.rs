//! Linux provisioning over a POSIX shell.

use anyhow::Result;
use hab_common::{OsType, ProvisioningRequest, ServiceDeclaration, ServiceManager, service_key_name};

use crate::application::ports::{ProgressReporter, RemoteChannel};
use crate::application::services::executor::RemoteExecutor;
use crate::domain::command::{
    Elevation, NONINTERACTIVE_ENV, elevate, package_install_options, service_load_command,
    shell_quote, supervisor_options, with_auth_token, with_options,
};
use crate::domain::error::ProvisionError;
use crate::domain::templates::systemd_unit;

use super::PlatformStrategy;

/// Official runtime install script.
pub const LINUX_INSTALL_URL: &str =
    "https://raw.githubusercontent.com/habitat-sh/habitat/main/components/hab/install.sh";

const SUP_LOG_DIR: &str = "/hab/sup/default";
const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";
const SERVICE_DIR: &str = "/hab/svc";
const KEY_CACHE_DIR: &str = "/hab/cache/keys";
const STAGING_DIR: &str = "/tmp";

pub struct LinuxStrategy<'a> {
    req: &'a ProvisioningRequest,
}

impl<'a> LinuxStrategy<'a> {
    #[must_use]
    pub fn new(req: &'a ProvisioningRequest) -> Self {
        Self { req }
    }

    fn sudo(&self, command: &str) -> String {
        elevate(command, self.req.use_sudo, Elevation::Plain)
    }

    fn sudo_env(&self, command: &str) -> String {
        elevate(command, self.req.use_sudo, Elevation::PreserveEnv)
    }

    fn token(&self) -> Option<&str> {
        self.req.builder_auth_token.as_deref()
    }

    /// Write `content` to `dir/file_name`. With sudo the file is staged in
    /// the temp directory first, since the transfer runs unprivileged.
    async fn write_file<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        dir: &str,
        file_name: &str,
        content: &str,
    ) -> Result<()> {
        let destination = format!("{dir}/{file_name}");
        if !self.req.use_sudo {
            return exec.upload(&destination, content.as_bytes()).await;
        }
        let staged = format!("{STAGING_DIR}/{file_name}");
        exec.upload(&staged, content.as_bytes()).await?;
        exec.run(&format!(
            "sudo mv {} {}",
            shell_quote(&staged)?,
            shell_quote(&destination)?
        ))
        .await
    }

    /// Create the `hab` account unless it already exists.
    async fn ensure_hab_user<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<()> {
        exec.run(&self.sudo(&format!("{NONINTERACTIVE_ENV} hab install core/busybox")))
            .await?;
        match exec
            .run(&self.sudo("hab pkg exec core/busybox id hab"))
            .await
        {
            Ok(()) => Ok(()),
            Err(e)
                if e.downcast_ref::<ProvisionError>()
                    .is_some_and(ProvisionError::is_nonzero_exit) =>
            {
                exec.reporter()
                    .step("No existing hab user detected, creating...");
                exec.run(&self.sudo("hab pkg exec core/busybox adduser -D -g \"\" hab"))
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn start_unmanaged<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        options: &str,
    ) -> Result<()> {
        exec.run(&format!(
            "{} && {}",
            self.sudo(&format!("mkdir -p {SUP_LOG_DIR}")),
            self.sudo(&format!("chmod o+w {SUP_LOG_DIR}"))
        ))
        .await?;

        let launch = with_auth_token(
            &format!("setsid {}", self.sudo_env(&with_options("hab sup run", options))),
            self.token(),
        );
        exec.run(&format!(
            "({launch} > {SUP_LOG_DIR}/sup.log 2>&1 < /dev/null &) ; sleep 1"
        ))
        .await
    }

    async fn start_systemd<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        options: &str,
    ) -> Result<()> {
        let name = &self.req.service_name;
        let unit = systemd_unit(options, self.token());
        self.write_file(exec, SYSTEMD_UNIT_DIR, &format!("{name}.service"), &unit)
            .await?;
        exec.run(&format!(
            "{} && {} && {}",
            self.sudo("systemctl daemon-reload"),
            self.sudo(&format!("systemctl enable {name}")),
            self.sudo(&format!("systemctl start {name}"))
        ))
        .await
    }
}

impl PlatformStrategy for LinuxStrategy<'_> {
    fn os(&self) -> OsType {
        OsType::Linux
    }

    fn supports_ring_key(&self) -> bool {
        true
    }

    async fn install_runtime<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<()> {
        exec.run(&format!("curl -fsSL {LINUX_INSTALL_URL} -o install.sh"))
            .await?;

        let install = match &self.req.version {
            Some(version) => format!("{NONINTERACTIVE_ENV} bash ./install.sh -v {version}"),
            None => format!("{NONINTERACTIVE_ENV} bash ./install.sh"),
        };
        exec.run(&self.sudo(&install)).await?;

        if self.req.accept_license {
            exec.run(&self.sudo("env HAB_LICENSE=accept hab -V")).await?;
        }

        self.ensure_hab_user(exec).await?;
        exec.run("rm -f install.sh").await
    }

    async fn upload_ring_key<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        content: &str,
    ) -> Result<()> {
        exec.run(&format!(
            "echo {} | {}",
            shell_quote(content)?,
            self.sudo("hab ring key import")
        ))
        .await
    }

    async fn start_supervisor<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
    ) -> Result<String> {
        let manager: ServiceManager = self
            .req
            .service_type
            .parse()
            .map_err(ProvisionError::from)?;

        let install = match &self.req.version {
            Some(version) => format!("hab install core/hab-sup/{version}"),
            None => "hab install core/hab-sup".to_string(),
        };
        exec.run(&format!("{NONINTERACTIVE_ENV} {}", self.sudo_env(&install)))
            .await?;

        let options = supervisor_options(self.req);
        tracing::debug!(manager = %manager, options = %options, "starting supervisor");
        match manager {
            ServiceManager::Unmanaged => self.start_unmanaged(exec, &options).await?,
            ServiceManager::Systemd => self.start_systemd(exec, &options).await?,
        }
        Ok(options)
    }

    async fn start_service<C: RemoteChannel, R: ProgressReporter>(
        &self,
        exec: &RemoteExecutor<'_, C, R>,
        service: &ServiceDeclaration,
    ) -> Result<()> {
        let install = with_options(
            &format!("hab pkg install {}", service.ident),
            &package_install_options(service),
        );
        exec.run(&with_auth_token(
            &format!("{NONINTERACTIVE_ENV} {}", self.sudo_env(&install)),
            self.token(),
        ))
        .await?;

        let dir = format!("{SERVICE_DIR}/{}", service.ident.name());
        exec.reporter()
            .step(&format!("Uploading user.toml for service: {}", service.ident));
        exec.run(&self.sudo(&format!("mkdir -p {dir}"))).await?;
        self.write_file(exec, &dir, "user.toml", &service.user_toml)
            .await?;

        if let Some(key) = &service.service_key {
            let key_name = service_key_name(key).map_err(ProvisionError::from)?;
            exec.reporter()
                .step(&format!("Uploading service group key: {key_name}"));
            self.write_file(exec, KEY_CACHE_DIR, &format!("{key_name}.box.key"), key)
                .await?;
        }

        exec.run(&with_auth_token(
            &self.sudo_env(&service_load_command(service)),
            self.token(),
        ))
        .await
    }
}
