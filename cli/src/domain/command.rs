//! Command builder: translates configuration values into remote command text.
//!
//! Pure functions only. Flag order lives in the ordering tables below so the
//! rendered strings are reproducible; the systemd unit embeds the supervisor
//! options verbatim.

use hab_common::{ProvisioningRequest, ServiceDeclaration};

use crate::domain::error::ProvisionError;

/// Prefix that stops `hab` from prompting on the remote host.
pub const NONINTERACTIVE_ENV: &str = "env HAB_NONINTERACTIVE=true";

// ── Elevation and environment ────────────────────────────────────────────────

/// How `sudo` wraps a command at a particular call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// `sudo <command>`
    Plain,
    /// `sudo -E <command>`, keeping the caller's environment (auth token,
    /// non-interactive flag).
    PreserveEnv,
}

/// Wrap `command` with `sudo` when `use_sudo` is set.
#[must_use]
pub fn elevate(command: &str, use_sudo: bool, elevation: Elevation) -> String {
    match (use_sudo, elevation) {
        (false, _) => command.to_string(),
        (true, Elevation::Plain) => format!("sudo {command}"),
        (true, Elevation::PreserveEnv) => format!("sudo -E {command}"),
    }
}

/// Prefix a POSIX command with the Builder auth token, when present.
#[must_use]
pub fn with_auth_token(command: &str, token: Option<&str>) -> String {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => format!("env HAB_AUTH_TOKEN={token} {command}"),
        None => command.to_string(),
    }
}

/// Prefix a Windows `cmd` command with the Builder auth token, when present.
#[must_use]
pub fn with_auth_token_windows(command: &str, token: Option<&str>) -> String {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => format!("set \"HAB_AUTH_TOKEN={token}\" && {command}"),
        None => command.to_string(),
    }
}

/// Append `options` to `command`, separated by a single space.
#[must_use]
pub fn with_options(command: &str, options: &str) -> String {
    if options.is_empty() {
        command.to_string()
    } else {
        format!("{command} {options}")
    }
}

/// Quote a value for a POSIX shell.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] if the value contains a NUL byte.
pub fn shell_quote(value: &str) -> Result<String, ProvisionError> {
    shlex::try_quote(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ProvisionError::Configuration(format!("cannot quote value for shell: {e}")))
}

/// Escape a value for embedding inside a PowerShell double-quoted string.
#[must_use]
pub fn powershell_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '`' | '"' | '$') {
            out.push('`');
        }
        out.push(c);
    }
    out
}

// ── Flag rendering ───────────────────────────────────────────────────────────

enum FlagValue<'a> {
    Switch(bool),
    Arg(Option<&'a str>),
}

fn arg(value: &Option<String>) -> FlagValue<'_> {
    FlagValue::Arg(value.as_deref())
}

#[derive(Default)]
struct Flags(Vec<String>);

impl Flags {
    fn push(&mut self, flag: &str, value: FlagValue<'_>) {
        match value {
            FlagValue::Switch(true) => self.0.push(flag.to_string()),
            FlagValue::Arg(Some(v)) if !v.is_empty() => self.0.push(format!("{flag} {v}")),
            FlagValue::Switch(false) | FlagValue::Arg(_) => {}
        }
    }

    fn render(self) -> String {
        self.0.join(" ")
    }
}

/// Options accepted by `hab sup run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorFlag {
    PermanentPeer,
    ListenGossip,
    ListenHttp,
    Peer,
    Ring,
    Url,
    Channel,
    Events,
    OverrideName,
    Organization,
}

/// Rendering order of supervisor options.
pub const SUPERVISOR_FLAG_ORDER: [SupervisorFlag; 10] = [
    SupervisorFlag::PermanentPeer,
    SupervisorFlag::ListenGossip,
    SupervisorFlag::ListenHttp,
    SupervisorFlag::Peer,
    SupervisorFlag::Ring,
    SupervisorFlag::Url,
    SupervisorFlag::Channel,
    SupervisorFlag::Events,
    SupervisorFlag::OverrideName,
    SupervisorFlag::Organization,
];

impl SupervisorFlag {
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::PermanentPeer => "-I",
            Self::ListenGossip => "--listen-gossip",
            Self::ListenHttp => "--listen-http",
            Self::Peer => "--peer",
            Self::Ring => "--ring",
            Self::Url => "--url",
            Self::Channel => "--channel",
            Self::Events => "--events",
            Self::OverrideName => "--override-name",
            Self::Organization => "--org",
        }
    }

    fn value(self, req: &ProvisioningRequest) -> FlagValue<'_> {
        match self {
            Self::PermanentPeer => FlagValue::Switch(req.permanent_peer),
            Self::ListenGossip => arg(&req.listen_gossip),
            Self::ListenHttp => arg(&req.listen_http),
            Self::Peer => arg(&req.peer),
            Self::Ring => arg(&req.ring_key),
            Self::Url => arg(&req.url),
            Self::Channel => arg(&req.channel),
            Self::Events => arg(&req.events),
            Self::OverrideName => arg(&req.override_name),
            Self::Organization => arg(&req.organization),
        }
    }
}

/// Options accepted by `hab svc load` and `hab pkg install`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFlag {
    Topology,
    Strategy,
    Channel,
    Url,
    Group,
}

/// Rendering order of `hab svc load` options; binds follow.
pub const SERVICE_LOAD_FLAG_ORDER: [ServiceFlag; 5] = [
    ServiceFlag::Topology,
    ServiceFlag::Strategy,
    ServiceFlag::Channel,
    ServiceFlag::Url,
    ServiceFlag::Group,
];

/// Rendering order of `hab pkg install` options.
pub const PACKAGE_INSTALL_FLAG_ORDER: [ServiceFlag; 2] = [ServiceFlag::Channel, ServiceFlag::Url];

impl ServiceFlag {
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::Topology => "--topology",
            Self::Strategy => "--strategy",
            Self::Channel => "--channel",
            Self::Url => "--url",
            Self::Group => "--group",
        }
    }

    fn value(self, svc: &ServiceDeclaration) -> FlagValue<'_> {
        match self {
            Self::Topology => FlagValue::Arg(svc.topology.map(|t| t.as_str())),
            Self::Strategy => FlagValue::Arg(svc.strategy.map(|s| s.as_str())),
            Self::Channel => FlagValue::Arg(svc.channel.as_deref()),
            Self::Url => FlagValue::Arg(svc.url.as_deref()),
            Self::Group => FlagValue::Arg(svc.group.as_deref()),
        }
    }
}

/// Options for `hab sup run`, e.g. `-I --peer 10.0.0.1 --ring prod`.
#[must_use]
pub fn supervisor_options(req: &ProvisioningRequest) -> String {
    let mut flags = Flags::default();
    for flag in SUPERVISOR_FLAG_ORDER {
        flags.push(flag.flag(), flag.value(req));
    }
    flags.render()
}

/// Options for `hab svc load`: the fixed flags, then one `--bind` per bind in
/// declaration order.
#[must_use]
pub fn service_load_options(svc: &ServiceDeclaration) -> String {
    let mut flags = Flags::default();
    for flag in SERVICE_LOAD_FLAG_ORDER {
        flags.push(flag.flag(), flag.value(svc));
    }
    for bind in &svc.binds {
        flags.push("--bind", FlagValue::Arg(Some(&bind.to_string())));
    }
    flags.render()
}

/// Options for the synchronous `hab pkg install` that precedes a load.
#[must_use]
pub fn package_install_options(svc: &ServiceDeclaration) -> String {
    let mut flags = Flags::default();
    for flag in PACKAGE_INSTALL_FLAG_ORDER {
        flags.push(flag.flag(), flag.value(svc));
    }
    flags.render()
}

/// `hab svc load <ident> <options>`.
#[must_use]
pub fn service_load_command(svc: &ServiceDeclaration) -> String {
    with_options(
        &format!("hab svc load {}", svc.ident),
        &service_load_options(svc),
    )
}
