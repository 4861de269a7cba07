//! Plan command: print every remote operation a run would perform, without
//! touching a host.

use anyhow::Result;
use hab_common::OsType;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::services::provision::provision;
use crate::commands::{ProvisionArgs, prepare};
use crate::domain::secrets::redact;
use crate::infra::dry_run::{Operation, RecordingChannel};
use crate::infra::ssh::default_script_path;
use crate::output::{OutputContext, TerminalReporter, json};

#[derive(Serialize)]
struct PlanOutput {
    target: String,
    os: OsType,
    operations: Vec<Operation>,
}

/// Run the plan command.
///
/// # Errors
///
/// Returns an error if the config is invalid or an operation cannot be
/// built (e.g. a malformed service group key).
pub async fn run(app: &AppContext, args: &ProvisionArgs) -> Result<()> {
    let run = prepare(args)?;

    let target = if run.connection.host.is_empty() {
        format!("{}@<host>:{}", run.connection.user, run.connection.port)
    } else {
        format!(
            "{}@{}:{}",
            run.connection.user, run.connection.host, run.connection.port
        )
    };
    let script_path = run
        .connection
        .script_path
        .clone()
        .unwrap_or_else(|| default_script_path(run.os).to_string());

    let channel = RecordingChannel::new(target.clone(), script_path);
    let silent = OutputContext::silent();
    provision(&channel, &TerminalReporter::new(&silent), &run.request, run.os).await?;

    let secrets: Vec<String> = run
        .request
        .secrets()
        .into_iter()
        .map(str::to_string)
        .collect();
    let operations: Vec<Operation> = channel
        .operations()
        .into_iter()
        .map(|op| redact_operation(op, &secrets))
        .collect();

    if app.json() {
        return json::print(&PlanOutput {
            target,
            os: run.os,
            operations,
        });
    }

    app.output
        .heading(&format!("Plan for {target} ({})", run.os));
    for (index, op) in operations.iter().enumerate() {
        println!("  {:>3}. {}", index + 1, describe(op));
    }
    Ok(())
}

fn redact_operation(op: Operation, secrets: &[String]) -> Operation {
    match op {
        Operation::Command { command } => Operation::Command {
            command: redact(&command, secrets),
        },
        Operation::Upload {
            destination,
            content,
        } => Operation::Upload {
            destination,
            content: redact(&content, secrets),
        },
        Operation::UploadScript {
            destination,
            content,
        } => Operation::UploadScript {
            destination,
            content: redact(&content, secrets),
        },
        other @ (Operation::Connect | Operation::Disconnect) => other,
    }
}

fn describe(op: &Operation) -> String {
    match op {
        Operation::Connect => "connect".to_string(),
        Operation::Disconnect => "disconnect".to_string(),
        Operation::Command { command } => format!("run     {command}"),
        Operation::Upload {
            destination,
            content,
        } => format!("upload  {destination} ({} bytes)", content.len()),
        Operation::UploadScript {
            destination,
            content,
        } => format!("script  {destination} ({} bytes)", content.len()),
    }
}
