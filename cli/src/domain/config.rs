//! Provisioning configuration schema, validation, and decoding.
//!
//! Pure functions only: no I/O, no async, no filesystem access.
//! `validate` collects every problem up front; `into_request` decodes a
//! validated config and stops at the first malformed value.

use std::path::PathBuf;
use std::time::Duration;

use hab_common::{
    Bind, ConnectionType, OsType, PackageIdent, ProvisioningRequest, ServiceDeclaration,
    ServiceManager, Topology, UpdateStrategy, request, service_key_name,
};
use serde::Deserialize;

use crate::domain::error::ProvisionError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Last runtime release that predates the end-user license agreement.
pub const LICENSE_BASELINE: semver::Version = semver::Version::new(0, 79, 0);

pub const DEFAULT_SSH_USER: &str = "root";
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 300;

const LICENSE_MESSAGE: &str = "Habitat end user license agreement needs to be accepted, set the accept_license argument to true to accept";

// ── Config schema ────────────────────────────────────────────────────────────

/// Provisioning request as written in the YAML config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProvisionConfig {
    pub version: String,
    /// Required; `None` means the key was absent.
    pub accept_license: Option<bool>,
    pub peer: String,
    pub service_type: String,
    pub service_name: String,
    pub use_sudo: bool,
    pub skip_install: bool,
    pub permanent_peer: bool,
    pub listen_gossip: String,
    pub listen_http: String,
    pub ring_key: String,
    pub ring_key_content: String,
    pub url: String,
    pub channel: String,
    pub events: String,
    pub override_name: String,
    pub organization: String,
    pub builder_auth_token: String,
    pub os_type: String,
    pub connection: ConnectionConfig,
    pub services: Vec<ServiceConfig>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            accept_license: None,
            peer: String::new(),
            service_type: request::DEFAULT_SERVICE_TYPE.to_string(),
            service_name: request::DEFAULT_SERVICE_NAME.to_string(),
            use_sudo: true,
            skip_install: false,
            permanent_peer: false,
            listen_gossip: String::new(),
            listen_http: String::new(),
            ring_key: String::new(),
            ring_key_content: String::new(),
            url: String::new(),
            channel: String::new(),
            events: String::new(),
            override_name: String::new(),
            organization: String::new(),
            builder_auth_token: String::new(),
            os_type: String::new(),
            connection: ConnectionConfig::default(),
            services: Vec::new(),
        }
    }
}

/// How to reach the target host.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConnectionConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub host: String,
    pub user: String,
    pub port: u16,
    pub private_key: Option<PathBuf>,
    pub timeout_secs: u64,
    pub script_path: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            kind: String::new(),
            host: String::new(),
            user: DEFAULT_SSH_USER.to_string(),
            port: DEFAULT_SSH_PORT,
            private_key: None,
            timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            script_path: None,
        }
    }
}

/// One `services` entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServiceConfig {
    pub name: String,
    pub strategy: String,
    pub topology: String,
    pub channel: String,
    pub group: String,
    pub url: String,
    /// Binds in `alias:service.group` form.
    pub binds: Vec<String>,
    /// Binds in structured form; these come first in load order.
    pub bind: Vec<Bind>,
    pub user_toml: String,
    pub service_key: String,
}

/// Decoded connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub kind: ConnectionType,
    pub host: String,
    pub user: String,
    pub port: u16,
    pub private_key: Option<PathBuf>,
    pub timeout: Duration,
    pub script_path: Option<String>,
}

// ── Validation ───────────────────────────────────────────────────────────────

impl ProvisionConfig {
    /// Check every setting and return all problems found (empty when valid).
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = self.service_type.parse::<ServiceManager>() {
            problems.push(e.to_string());
        }
        if let Some(problem) = check_url(&self.url) {
            problems.push(problem);
        }

        let version = if self.version.trim().is_empty() {
            None
        } else {
            match parse_version(&self.version) {
                Ok(v) => Some(v),
                Err(problem) => {
                    problems.push(problem);
                    None
                }
            }
        };
        match self.accept_license {
            None => problems.push("accept_license must be set".to_string()),
            Some(false) if self.version.trim().is_empty() || version.as_ref().is_some_and(license_required) => {
                problems.push(LICENSE_MESSAGE.to_string());
            }
            Some(_) => {}
        }

        if !self.os_type.is_empty() {
            if let Err(e) = self.os_type.parse::<OsType>() {
                problems.push(e.to_string());
            }
        }
        if let Err(e) = ConnectionType::parse_or_default(&self.connection.kind) {
            problems.push(e.to_string());
        }

        for (i, service) in self.services.iter().enumerate() {
            let prefix = format!("services[{i}] ({})", service.name);
            problems.extend(
                service
                    .problems()
                    .into_iter()
                    .map(|p| format!("{prefix}: {p}")),
            );
        }
        problems
    }

    /// Decode into a [`ProvisioningRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Configuration`] for the first malformed value.
    pub fn into_request(self) -> Result<ProvisioningRequest, ProvisionError> {
        let os_type = if self.os_type.is_empty() {
            None
        } else {
            Some(self.os_type.parse::<OsType>()?)
        };
        let services = self
            .services
            .into_iter()
            .map(ServiceConfig::into_declaration)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProvisioningRequest {
            version: non_empty(self.version.trim().to_string()),
            accept_license: self.accept_license.unwrap_or(false),
            skip_install: self.skip_install,
            use_sudo: self.use_sudo,
            service_type: self.service_type,
            service_name: self.service_name,
            permanent_peer: self.permanent_peer,
            listen_gossip: non_empty(self.listen_gossip),
            listen_http: non_empty(self.listen_http),
            peer: non_empty(self.peer),
            ring_key: non_empty(self.ring_key),
            ring_key_content: non_empty(self.ring_key_content),
            url: non_empty(self.url),
            channel: non_empty(self.channel),
            events: non_empty(self.events),
            override_name: non_empty(self.override_name),
            organization: non_empty(self.organization),
            builder_auth_token: non_empty(self.builder_auth_token),
            os_type,
            services,
        })
    }

    /// Decode the `connection` table.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Configuration`] for an unsupported connection type.
    pub fn connection_settings(&self) -> Result<ConnectionSettings, ProvisionError> {
        let c = &self.connection;
        Ok(ConnectionSettings {
            kind: ConnectionType::parse_or_default(&c.kind)?,
            host: c.host.clone(),
            user: c.user.clone(),
            port: c.port,
            private_key: c.private_key.clone(),
            timeout: Duration::from_secs(c.timeout_secs),
            script_path: c.script_path.clone().filter(|p| !p.is_empty()),
        })
    }
}

impl ServiceConfig {
    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if let Err(e) = self.name.parse::<PackageIdent>() {
            problems.push(e.to_string());
        }
        if !self.strategy.is_empty() {
            if let Err(e) = self.strategy.parse::<UpdateStrategy>() {
                problems.push(e.to_string());
            }
        }
        if !self.topology.is_empty() {
            if let Err(e) = self.topology.parse::<Topology>() {
                problems.push(e.to_string());
            }
        }
        if let Some(problem) = check_url(&self.url) {
            problems.push(problem);
        }
        problems.extend(
            self.bind
                .iter()
                .filter_map(|b| b.validate().err())
                .chain(self.binds.iter().filter_map(|b| b.parse::<Bind>().err()))
                .map(|e| e.to_string()),
        );
        if !self.user_toml.trim().is_empty() {
            if let Err(e) = self.user_toml.parse::<toml::Table>() {
                problems.push(format!("user_toml is not valid TOML: {}", e.message()));
            }
        }
        if !self.service_key.is_empty() {
            if let Err(e) = service_key_name(&self.service_key) {
                problems.push(e.to_string());
            }
        }
        problems
    }

    fn into_declaration(self) -> Result<ServiceDeclaration, ProvisionError> {
        for bind in &self.bind {
            bind.validate()?;
        }
        let mut binds = self.bind;
        for raw in &self.binds {
            binds.push(raw.parse()?);
        }
        Ok(ServiceDeclaration {
            ident: self.name.parse()?,
            strategy: parse_optional(&self.strategy)?,
            topology: parse_optional(&self.topology)?,
            channel: non_empty(self.channel),
            group: non_empty(self.group),
            url: non_empty(self.url),
            binds,
            user_toml: self.user_toml,
            service_key: non_empty(self.service_key),
        })
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Parse a runtime version, accepting one leading `v` and the `MAJOR` and
/// `MAJOR.MINOR` shorthands.
///
/// # Errors
///
/// Returns a human-readable problem string when the version is malformed.
pub fn parse_version(raw: &str) -> Result<semver::Version, String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
    let padded = match trimmed.split('.').count() {
        1 => format!("{trimmed}.0.0"),
        2 => format!("{trimmed}.0"),
        _ => trimmed.to_string(),
    };
    semver::Version::parse(&padded).map_err(|_| format!("{raw} is not a valid version."))
}

/// Versions newer than the baseline ship under the license agreement.
#[must_use]
pub fn license_required(version: &semver::Version) -> bool {
    *version > LICENSE_BASELINE
}

fn check_url(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match url::Url::parse(raw) {
        Ok(u) if u.has_host() || u.scheme() == "file" => None,
        _ => Some(format!("{raw} is not a valid URL.")),
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn parse_optional<T>(raw: &str) -> Result<Option<T>, ProvisionError>
where
    T: std::str::FromStr<Err = hab_common::ModelError>,
{
    if raw.is_empty() {
        Ok(None)
    } else {
        Ok(Some(raw.parse()?))
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
