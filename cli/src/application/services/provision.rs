//! Provision use-case.
//!
//! Drives one run against one host: connect with retry, install the runtime,
//! import the ring key, start the supervisor, then load each service in
//! declaration order. The first failing step aborts the run; the channel is
//! always released once connected.

use std::time::Duration;

use anyhow::Result;
use hab_common::{ConnectionType, OsType, ProvisioningRequest};
use serde::Serialize;
use tokio::time::Instant;

use crate::application::ports::{ProgressReporter, RemoteChannel};
use crate::application::services::executor::RemoteExecutor;
use crate::application::services::platform::{Platform, PlatformStrategy};
use crate::domain::error::ProvisionError;

/// First delay between connection attempts; doubles up to [`MAX_RETRY_DELAY`].
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub os: OsType,
    /// Options the supervisor was started with.
    pub supervisor_options: String,
    /// Services loaded, in order.
    pub services_loaded: Vec<String>,
}

/// Resolve the target OS. An explicit OS wins; otherwise it follows from the
/// connection type (`ssh` or empty: linux, `winrm`: windows).
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] for an unsupported connection
/// type.
pub fn resolve_os(explicit: Option<OsType>, connection_type: &str) -> Result<OsType> {
    if let Some(os) = explicit {
        return Ok(os);
    }
    let kind = ConnectionType::parse_or_default(connection_type).map_err(|_| {
        ProvisionError::Configuration(format!("Unsupported connection type: {connection_type}"))
    })?;
    Ok(kind.implied_os())
}

/// Connect, retrying failed attempts until the channel's timeout elapses.
///
/// # Errors
///
/// Returns [`ProvisionError::Connection`] with the last failure when no
/// attempt succeeds in time.
pub async fn connect_with_retry<C: RemoteChannel>(channel: &C) -> Result<()> {
    let budget = channel.timeout();
    let deadline = Instant::now() + budget;
    let mut delay = INITIAL_RETRY_DELAY;
    let mut attempt = 1u32;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let reason = match tokio::time::timeout(remaining, channel.connect()).await {
            Ok(Ok(())) => {
                tracing::info!(host = %channel.describe(), attempt, "connected");
                return Ok(());
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(_) => "connection attempt timed out".to_string(),
        };

        if Instant::now() + delay >= deadline {
            return Err(ProvisionError::Connection {
                target: channel.describe(),
                timeout_secs: budget.as_secs(),
                reason,
            }
            .into());
        }
        tracing::debug!(attempt, reason = %reason, delay = ?delay, "connect failed, retrying");
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_RETRY_DELAY);
        attempt += 1;
    }
}

/// Provision one host.
///
/// # Errors
///
/// Returns the first step failure. Later steps do not run.
pub async fn provision<C, R>(
    channel: &C,
    reporter: &R,
    request: &ProvisioningRequest,
    os: OsType,
) -> Result<ProvisionReport>
where
    C: RemoteChannel,
    R: ProgressReporter,
{
    let platform = Platform::select(os, request);
    tracing::info!(os = %os, host = %channel.describe(), "provisioning");

    reporter.step(&format!("Connecting to {}...", channel.describe()));
    connect_with_retry(channel).await?;

    let result = run_steps(channel, reporter, request, &platform).await;

    if let Err(e) = channel.disconnect().await {
        tracing::warn!(error = %format!("{e:#}"), "disconnect failed");
    }
    result
}

async fn run_steps<C, R>(
    channel: &C,
    reporter: &R,
    request: &ProvisioningRequest,
    platform: &Platform<'_>,
) -> Result<ProvisionReport>
where
    C: RemoteChannel,
    R: ProgressReporter,
{
    let exec = RemoteExecutor::new(channel, reporter).with_secrets(request.secrets());

    if request.skip_install {
        tracing::info!("skipping runtime install");
    } else {
        reporter.step("Installing habitat...");
        platform.install_runtime(&exec).await?;
        reporter.success("habitat installed");
    }

    if let Some(content) = request.ring_key_content.as_deref().filter(|c| !c.is_empty()) {
        if platform.supports_ring_key() {
            reporter.step("Uploading supervisor ring key...");
            platform.upload_ring_key(&exec, content).await?;
        } else {
            reporter.warn(&format!(
                "ring key import is not supported on {} hosts; skipping",
                platform.os()
            ));
        }
    }

    reporter.step("Starting the habitat supervisor...");
    let supervisor_options = platform.start_supervisor(&exec).await?;
    reporter.success("supervisor started");

    let mut report = ProvisionReport {
        os: platform.os(),
        supervisor_options,
        services_loaded: Vec::with_capacity(request.services.len()),
    };
    for service in &request.services {
        reporter.step(&format!("Starting service: {}", service.ident));
        platform.start_service(&exec, service).await?;
        tracing::info!(service = %service.ident, "service loaded");
        report.services_loaded.push(service.ident.to_string());
    }
    Ok(report)
}
