//! Command-line surface.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::app::AppContext;
use crate::commands::{self, ProvisionArgs, validate::ValidateArgs};

/// Provision Habitat supervisors and services onto remote hosts
#[derive(Parser)]
#[command(
    name = "hab-provision",
    version,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every subcommand.
#[derive(Args)]
pub struct GlobalArgs {
    /// Print a JSON document instead of progress output
    #[arg(long, global = true)]
    pub json: bool,

    /// Print errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also disabled by NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision the configured host over SSH
    Apply(ProvisionArgs),

    /// List the remote operations a run would perform, without connecting
    Plan(ProvisionArgs),

    /// Check a config file and report every problem
    Validate(ValidateArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Dispatch to the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's failure.
    pub async fn run(self) -> Result<()> {
        let app = AppContext::new(&self.global);
        match self.command {
            Command::Apply(args) => commands::apply::run(&app, &args).await,
            Command::Plan(args) => commands::plan::run(&app, &args).await,
            Command::Validate(args) => commands::validate::run(&app, &args),
            Command::Version => commands::version::run(&app),
        }
    }
}
