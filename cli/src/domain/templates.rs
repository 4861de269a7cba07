//! Generated artifacts written to the target host: the supervisor systemd
//! unit and the Windows install/start scripts.

use crate::domain::command::powershell_escape;

/// Windows release archive for the latest runtime.
pub const WINDOWS_LATEST_URL: &str =
    "https://packages.chef.io/files/stable/habitat/latest/hab-x86_64-windows.zip";

/// Gossip and HTTP gateway ports opened inbound on Windows hosts.
pub const GOSSIP_PORT: u16 = 9638;
pub const HTTP_GATEWAY_PORT: u16 = 9631;

/// Index of the launcher-arguments entry in `HabService.dll.config`'s
/// `appSettings`.
pub const LAUNCHER_ARGS_SETTING: usize = 2;

/// Render the supervisor unit file.
#[must_use]
pub fn systemd_unit(supervisor_options: &str, auth_token: Option<&str>) -> String {
    let exec_start = format!("/bin/hab sup run {supervisor_options}");
    let mut unit = String::from("[Unit]\nDescription=Habitat Supervisor\n\n[Service]\n");
    unit.push_str(&format!("ExecStart={}\n", exec_start.trim_end()));
    unit.push_str("Restart=on-failure\n");
    if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
        unit.push_str(&format!("Environment=\"HAB_AUTH_TOKEN={token}\"\n"));
    }
    unit.push_str("\n[Install]\nWantedBy=default.target\n");
    unit
}

/// Download URL of the Windows runtime archive, pinned when `version` is set.
#[must_use]
pub fn windows_download_url(version: Option<&str>) -> String {
    match version {
        Some(v) => format!("https://packages.chef.io/files/stable/habitat/{v}/hab-x86_64-windows.zip"),
        None => WINDOWS_LATEST_URL.to_string(),
    }
}

/// PowerShell script that installs the runtime, registers the supervisor as a
/// Windows service, and opens the gossip/HTTP ports.
#[must_use]
pub fn windows_install_script(version: Option<&str>, accept_license: bool) -> String {
    let url = windows_download_url(version);
    let mut script = String::new();
    script.push_str("$ErrorActionPreference = \"Stop\"\n");
    script.push_str("[Net.ServicePointManager]::SecurityProtocol = [Net.SecurityProtocolType]::Tls12\n");
    if accept_license {
        script.push_str("$env:HAB_LICENSE = \"accept-no-persist\"\n");
    }
    script.push_str(&format!("Invoke-WebRequest \"{url}\" -OutFile C:\\habitat.zip\n"));
    script.push_str("Expand-Archive C:\\habitat.zip C:\\ -Force\n");
    script.push_str("Move-Item C:\\hab-* C:\\habitat\n");
    script.push_str("$env:Path = $env:Path,\"C:\\habitat\" -join \";\"\n");
    script.push_str(
        "[System.Environment]::SetEnvironmentVariable('Path', $env:Path, [System.EnvironmentVariableTarget]::Machine)\n",
    );
    script.push_str("hab pkg install core/windows-service\n");
    script.push_str("if ($LASTEXITCODE -ne 0) { exit $LASTEXITCODE }\n");
    script.push_str("hab pkg exec core/windows-service install\n");
    script.push_str("if ($LASTEXITCODE -ne 0) { exit $LASTEXITCODE }\n");
    script.push_str(&format!(
        "New-NetFirewallRule -DisplayName \"Habitat TCP\" -Direction Inbound -Action Allow -Protocol TCP -LocalPort {HTTP_GATEWAY_PORT},{GOSSIP_PORT}\n"
    ));
    script.push_str(&format!(
        "New-NetFirewallRule -DisplayName \"Habitat UDP\" -Direction Inbound -Action Allow -Protocol UDP -LocalPort {GOSSIP_PORT}\n"
    ));
    script
}

/// PowerShell script that writes the supervisor options into the Windows
/// service configuration and starts the service.
#[must_use]
pub fn windows_start_script(supervisor_options: &str) -> String {
    let mut script = String::new();
    script.push_str("$svcPath = Join-Path $env:SystemDrive \"hab\\svc\\windows-service\"\n");
    script.push_str("[xml]$configXml = Get-Content (Join-Path $svcPath HabService.dll.config)\n");
    script.push_str(&format!(
        "$configXml.configuration.appSettings.add[{LAUNCHER_ARGS_SETTING}].value = \"{}\"\n",
        powershell_escape(supervisor_options)
    ));
    script.push_str("$configXml.Save((Join-Path $svcPath HabService.dll.config))\n");
    script.push_str("Start-Service Habitat\n");
    script
}
