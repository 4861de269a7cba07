//! Subcommands, plus the config loading `apply` and `plan` share.

pub mod apply;
pub mod plan;
pub mod validate;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use hab_common::{OsType, ProvisioningRequest};

use crate::application::services::provision::resolve_os;
use crate::domain::config::ConnectionSettings;
use crate::domain::error::ProvisionError;
use crate::infra::config::{CONFIG_ENV, load_config};

/// Arguments shared by `apply` and `plan`.
#[derive(Args)]
pub struct ProvisionArgs {
    /// Provisioning config file (YAML)
    #[arg(short, long, env = CONFIG_ENV)]
    pub config: PathBuf,

    /// Target OS, overriding the config and connection type
    #[arg(long, value_enum)]
    pub os_type: Option<OsType>,
}

/// A validated, decoded run: what to provision, where, and for which OS.
pub struct PreparedRun {
    pub request: ProvisioningRequest,
    pub connection: ConnectionSettings,
    pub os: OsType,
}

/// Load, validate, and decode the config named by `args`.
///
/// # Errors
///
/// Returns [`ProvisionError::Validation`] listing every problem found, or
/// [`ProvisionError::Configuration`] if the file cannot be loaded or decoded.
pub fn prepare(args: &ProvisionArgs) -> Result<PreparedRun> {
    let config = load_config(&args.config)?;
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ProvisionError::Validation(problems).into());
    }

    let connection = config.connection_settings()?;
    let connection_type = config.connection.kind.clone();
    let mut request = config.into_request()?;
    let os = resolve_os(args.os_type.or(request.os_type), &connection_type)?;
    request.os_type = Some(os);

    Ok(PreparedRun {
        request,
        connection,
        os,
    })
}
