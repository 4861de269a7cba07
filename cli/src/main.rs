//! hab-provision - Provision Habitat supervisors and services onto remote hosts

use clap::Parser;
use hab_provisioner::cli::Cli;
use hab_provisioner::domain::error::ProvisionError;
use hab_provisioner::output::{OutputContext, json};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (as_json, no_color) = (cli.global.json, cli.global.no_color);
    if let Err(e) = cli.run().await {
        let code = e
            .downcast_ref::<ProvisionError>()
            .map_or("error", ProvisionError::as_label);
        let message = format!("{e:#}");
        tracing::debug!(code, "command failed");
        match json::format_error(&message, code) {
            Ok(text) if as_json => println!("{text}"),
            _ => OutputContext::new(no_color, false).error(&message),
        }
        std::process::exit(1);
    }
}
