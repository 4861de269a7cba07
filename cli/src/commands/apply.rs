//! Apply command: provision the configured host over SSH.

use anyhow::Result;
use hab_common::ConnectionType;

use crate::app::AppContext;
use crate::application::services::provision::{ProvisionReport, provision};
use crate::commands::{ProvisionArgs, prepare};
use crate::domain::error::ProvisionError;
use crate::infra::ssh::SshChannel;
use crate::output::{TerminalReporter, json};

/// Run the apply command.
///
/// # Errors
///
/// Returns the first configuration, connection, or step failure.
pub async fn run(app: &AppContext, args: &ProvisionArgs) -> Result<()> {
    let run = prepare(args)?;

    if run.connection.kind == ConnectionType::Winrm {
        return Err(ProvisionError::Configuration(
            "winrm connections are not supported; use `type: ssh` with OpenSSH on the Windows host"
                .to_string(),
        )
        .into());
    }
    if run.connection.host.is_empty() {
        return Err(
            ProvisionError::Configuration("connection.host is required".to_string()).into(),
        );
    }

    let channel = SshChannel::new(run.connection, run.os)?;
    let reporter = TerminalReporter::new(&app.output);
    let report = provision(&channel, &reporter, &run.request, run.os).await?;

    if app.json() {
        return json::print(&report);
    }
    print_summary(app, &report, reporter.steps());
    Ok(())
}

fn print_summary(app: &AppContext, report: &ProvisionReport, steps: usize) {
    app.output
        .success(&format!("Provisioning complete ({steps} steps)"));
    app.output.field("os", report.os);
    app.output.field("supervisor options", or_none(&report.supervisor_options));
    app.output
        .field("services", or_none(&report.services_loaded.join(", ")));
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}
