use serde::Serialize;

use crate::bind::Bind;
use crate::ident::PackageIdent;
use crate::types::{OsType, Topology, UpdateStrategy};

/// Default supervisor unit / service name.
pub const DEFAULT_SERVICE_NAME: &str = "hab-supervisor";
/// Default supervisor service manager on Linux.
pub const DEFAULT_SERVICE_TYPE: &str = "systemd";

/// A decoded provisioning request: global supervisor settings plus the
/// services to load, in declaration order.
///
/// Optional string settings are `None` when unset; the command builder never
/// sees empty strings.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    /// Runtime version to install; `None` installs the latest release.
    pub version: Option<String>,
    pub accept_license: bool,
    pub skip_install: bool,
    pub use_sudo: bool,
    /// Raw service manager token. Parsed by the Linux supervisor step so an
    /// unsupported value fails there before any remote command is issued.
    pub service_type: String,
    /// Supervisor unit name (`<service_name>.service` on systemd hosts).
    pub service_name: String,
    pub permanent_peer: bool,
    pub listen_gossip: Option<String>,
    pub listen_http: Option<String>,
    pub peer: Option<String>,
    /// Ring name passed to the supervisor.
    pub ring_key: Option<String>,
    /// Ring key material imported on the host before the supervisor starts.
    pub ring_key_content: Option<String>,
    pub url: Option<String>,
    pub channel: Option<String>,
    pub events: Option<String>,
    pub override_name: Option<String>,
    pub organization: Option<String>,
    pub builder_auth_token: Option<String>,
    /// Explicit target OS; detected from the connection type when `None`.
    pub os_type: Option<OsType>,
    pub services: Vec<ServiceDeclaration>,
}

impl Default for ProvisioningRequest {
    fn default() -> Self {
        Self {
            version: None,
            accept_license: false,
            skip_install: false,
            use_sudo: true,
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            permanent_peer: false,
            listen_gossip: None,
            listen_http: None,
            peer: None,
            ring_key: None,
            ring_key_content: None,
            url: None,
            channel: None,
            events: None,
            override_name: None,
            organization: None,
            builder_auth_token: None,
            os_type: None,
            services: Vec::new(),
        }
    }
}

impl ProvisioningRequest {
    /// Secret values that must never appear in logs or error messages.
    #[must_use]
    pub fn secrets(&self) -> Vec<&str> {
        self.builder_auth_token
            .iter()
            .chain(self.ring_key_content.iter())
            .chain(self.services.iter().filter_map(|s| s.service_key.as_ref()))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// One service to load into the supervisor.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDeclaration {
    pub ident: PackageIdent,
    pub strategy: Option<UpdateStrategy>,
    pub topology: Option<Topology>,
    pub channel: Option<String>,
    pub group: Option<String>,
    pub url: Option<String>,
    pub binds: Vec<Bind>,
    /// TOML configuration overlay written as the service's `user.toml`.
    #[serde(skip)]
    pub user_toml: String,
    /// Armored service group key.
    #[serde(skip)]
    pub service_key: Option<String>,
}

impl ServiceDeclaration {
    /// A declaration with only the package identifier set.
    #[must_use]
    pub fn new(ident: PackageIdent) -> Self {
        Self {
            ident,
            strategy: None,
            topology: None,
            channel: None,
            group: None,
            url: None,
            binds: Vec::new(),
            user_toml: String::new(),
            service_key: None,
        }
    }
}
