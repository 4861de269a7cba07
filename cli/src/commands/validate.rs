//! Validate command: check a config file without contacting any host.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::domain::error::ProvisionError;
use crate::infra::config::{CONFIG_ENV, load_config};
use crate::output::json;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Provisioning config file (YAML)
    #[arg(short, long, env = CONFIG_ENV)]
    pub config: PathBuf,
}

/// Run the validate command.
///
/// # Errors
///
/// Returns [`ProvisionError::Validation`] listing every problem found.
pub fn run(app: &AppContext, args: &ValidateArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ProvisionError::Validation(problems).into());
    }

    if app.json() {
        json::print(&serde_json::json!({ "valid": true }))?;
    } else {
        app.output.success("configuration is valid");
    }
    Ok(())
}
