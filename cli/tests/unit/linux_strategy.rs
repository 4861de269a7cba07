//! Unit tests for the Linux platform strategy: exact command sequences.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use hab_common::{ProvisioningRequest, ServiceDeclaration, Topology};
use hab_provisioner::application::services::executor::RemoteExecutor;
use hab_provisioner::application::services::platform::{
    LINUX_INSTALL_URL, LinuxStrategy, PlatformStrategy,
};
use hab_provisioner::domain::command::shell_quote;
use hab_provisioner::domain::error::ProvisionError;
use hab_provisioner::domain::templates::systemd_unit;

use crate::mocks::{Failure, MockChannel, Op, RecordingReporter};

fn request() -> ProvisioningRequest {
    ProvisioningRequest {
        accept_license: true,
        ..ProvisioningRequest::default()
    }
}

fn redis() -> ServiceDeclaration {
    let mut svc = ServiceDeclaration::new("core/redis".parse().unwrap());
    svc.topology = Some(Topology::Standalone);
    svc
}

fn sudo_mv(from: &str, to: &str) -> String {
    format!(
        "sudo mv {} {}",
        shell_quote(from).unwrap(),
        shell_quote(to).unwrap()
    )
}

fn label(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<ProvisionError>()
        .expect("expected a ProvisionError")
        .as_label()
}

// ── install_runtime ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_install_runtime_command_sequence() {
    let req = request();
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req).install_runtime(&exec).await.unwrap();

    assert_eq!(
        channel.commands(),
        vec![
            format!("curl -fsSL {LINUX_INSTALL_URL} -o install.sh"),
            "sudo env HAB_NONINTERACTIVE=true bash ./install.sh".to_string(),
            "sudo env HAB_LICENSE=accept hab -V".to_string(),
            "sudo env HAB_NONINTERACTIVE=true hab install core/busybox".to_string(),
            "sudo hab pkg exec core/busybox id hab".to_string(),
            "rm -f install.sh".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_install_runtime_pinned_version_without_sudo_or_license() {
    let req = ProvisioningRequest {
        version: Some("1.6.0".to_string()),
        use_sudo: false,
        ..ProvisioningRequest::default()
    };
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req).install_runtime(&exec).await.unwrap();

    let commands = channel.commands();
    assert_eq!(
        commands[1],
        "env HAB_NONINTERACTIVE=true bash ./install.sh -v 1.6.0"
    );
    assert!(!commands.iter().any(|c| c.contains("HAB_LICENSE")));
    assert!(!commands.iter().any(|c| c.starts_with("sudo")));
}

#[tokio::test]
async fn test_install_runtime_creates_hab_user_when_missing() {
    let req = request();
    let channel = MockChannel::linux().fail_command("id hab", Failure::Exit(1));
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req).install_runtime(&exec).await.unwrap();

    let commands = channel.commands();
    let check = commands.iter().position(|c| c.contains("id hab")).unwrap();
    assert_eq!(
        commands[check + 1],
        "sudo hab pkg exec core/busybox adduser -D -g \"\" hab"
    );
    assert_eq!(commands.last().unwrap(), "rm -f install.sh");
    assert!(
        reporter
            .steps()
            .contains(&"No existing hab user detected, creating...".to_string())
    );
}

#[tokio::test]
async fn test_install_runtime_user_check_transport_fault_is_fatal() {
    let req = request();
    let channel = MockChannel::linux().fail_command("id hab", Failure::Transport("reset"));
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    let err = LinuxStrategy::new(&req)
        .install_runtime(&exec)
        .await
        .unwrap_err();

    assert_eq!(label(&err), "execution");
    let commands = channel.commands();
    assert!(!commands.iter().any(|c| c.contains("adduser")));
    assert!(!commands.iter().any(|c| c.contains("rm -f install.sh")));
}

#[tokio::test]
async fn test_install_runtime_aborts_on_first_failure() {
    let req = request();
    let channel = MockChannel::linux().fail_command("bash ./install.sh", Failure::Exit(1));
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    let err = LinuxStrategy::new(&req)
        .install_runtime(&exec)
        .await
        .unwrap_err();

    assert_eq!(label(&err), "execution");
    assert_eq!(channel.commands().len(), 2);
}

// ── upload_ring_key ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_ring_key_pipes_content_into_import() {
    let req = request();
    let content = "SYM-SEC-1\nprod-20240101\n\nc2VjcmV0=";
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req)
        .upload_ring_key(&exec, content)
        .await
        .unwrap();

    assert_eq!(
        channel.commands(),
        vec![format!(
            "echo {} | sudo hab ring key import",
            shell_quote(content).unwrap()
        )]
    );
}

// ── start_supervisor ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_supervisor_systemd() {
    let req = ProvisioningRequest {
        permanent_peer: true,
        peer: Some("10.0.0.1".to_string()),
        ..request()
    };
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    let options = LinuxStrategy::new(&req)
        .start_supervisor(&exec)
        .await
        .unwrap();

    assert_eq!(options, "-I --peer 10.0.0.1");
    assert_eq!(
        channel.ops(),
        vec![
            Op::Run("env HAB_NONINTERACTIVE=true sudo -E hab install core/hab-sup".to_string()),
            Op::Upload(
                "/tmp/hab-supervisor.service".to_string(),
                systemd_unit("-I --peer 10.0.0.1", None)
            ),
            Op::Run(sudo_mv(
                "/tmp/hab-supervisor.service",
                "/etc/systemd/system/hab-supervisor.service"
            )),
            Op::Run(
                "sudo systemctl daemon-reload && sudo systemctl enable hab-supervisor \
                 && sudo systemctl start hab-supervisor"
                    .to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn test_start_supervisor_systemd_unit_carries_auth_token() {
    let req = ProvisioningRequest {
        builder_auth_token: Some("tok".to_string()),
        ..request()
    };
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req)
        .start_supervisor(&exec)
        .await
        .unwrap();

    let (_, unit) = &channel.uploads()[0];
    assert!(unit.contains("Environment=\"HAB_AUTH_TOKEN=tok\""), "got: {unit}");
}

#[tokio::test]
async fn test_start_supervisor_systemd_without_sudo_uses_service_name() {
    let req = ProvisioningRequest {
        use_sudo: false,
        service_name: "hab-sup".to_string(),
        version: Some("1.6.0".to_string()),
        ..request()
    };
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req)
        .start_supervisor(&exec)
        .await
        .unwrap();

    assert_eq!(
        channel.ops(),
        vec![
            Op::Run("env HAB_NONINTERACTIVE=true hab install core/hab-sup/1.6.0".to_string()),
            Op::Upload(
                "/etc/systemd/system/hab-sup.service".to_string(),
                systemd_unit("", None)
            ),
            Op::Run(
                "systemctl daemon-reload && systemctl enable hab-sup && systemctl start hab-sup"
                    .to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn test_start_supervisor_unmanaged_launches_detached() {
    let req = ProvisioningRequest {
        service_type: "unmanaged".to_string(),
        builder_auth_token: Some("tok".to_string()),
        ring_key: Some("prod".to_string()),
        ..request()
    };
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req)
        .start_supervisor(&exec)
        .await
        .unwrap();

    assert_eq!(
        channel.commands(),
        vec![
            "env HAB_NONINTERACTIVE=true sudo -E hab install core/hab-sup".to_string(),
            "sudo mkdir -p /hab/sup/default && sudo chmod o+w /hab/sup/default".to_string(),
            "(env HAB_AUTH_TOKEN=tok setsid sudo -E hab sup run --ring prod \
             > /hab/sup/default/sup.log 2>&1 < /dev/null &) ; sleep 1"
                .to_string(),
        ]
    );
    assert!(channel.uploads().is_empty());
}

#[tokio::test]
async fn test_start_supervisor_unknown_service_type_issues_no_command() {
    let req = ProvisioningRequest {
        service_type: "upstart".to_string(),
        ..request()
    };
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    let err = LinuxStrategy::new(&req)
        .start_supervisor(&exec)
        .await
        .unwrap_err();

    assert_eq!(label(&err), "configuration");
    assert!(err.to_string().contains("upstart"));
    assert!(channel.ops().is_empty());
}

// ── start_service ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_service_sequence() {
    let req = request();
    let mut svc = redis();
    svc.user_toml = "port = 6380\n".to_string();
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req)
        .start_service(&exec, &svc)
        .await
        .unwrap();

    assert_eq!(
        channel.ops(),
        vec![
            Op::Run("env HAB_NONINTERACTIVE=true sudo -E hab pkg install core/redis".to_string()),
            Op::Run("sudo mkdir -p /hab/svc/redis".to_string()),
            Op::Upload("/tmp/user.toml".to_string(), "port = 6380\n".to_string()),
            Op::Run(sudo_mv("/tmp/user.toml", "/hab/svc/redis/user.toml")),
            Op::Run("sudo -E hab svc load core/redis --topology standalone".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_start_service_passes_channel_url_and_token() {
    let req = ProvisioningRequest {
        builder_auth_token: Some("tok".to_string()),
        ..request()
    };
    let mut svc = redis();
    svc.channel = Some("unstable".to_string());
    svc.url = Some("https://bldr.example.com".to_string());
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req)
        .start_service(&exec, &svc)
        .await
        .unwrap();

    let commands = channel.commands();
    assert_eq!(
        commands[0],
        "env HAB_AUTH_TOKEN=tok env HAB_NONINTERACTIVE=true sudo -E hab pkg install core/redis \
         --channel unstable --url https://bldr.example.com"
    );
    assert_eq!(
        commands.last().unwrap(),
        "env HAB_AUTH_TOKEN=tok sudo -E hab svc load core/redis --topology standalone \
         --channel unstable --url https://bldr.example.com"
    );
}

#[tokio::test]
async fn test_start_service_uploads_service_key_under_its_name() {
    let req = request();
    let key = "BOX-SEC-1\nredis.default@acme\n\nc2VjcmV0=";
    let mut svc = redis();
    svc.service_key = Some(key.to_string());
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    LinuxStrategy::new(&req)
        .start_service(&exec, &svc)
        .await
        .unwrap();

    let ops = channel.ops();
    let staged = Op::Upload("/tmp/redis.default@acme.box.key".to_string(), key.to_string());
    let at = ops.iter().position(|op| *op == staged).unwrap();
    assert_eq!(
        ops[at + 1],
        Op::Run(sudo_mv(
            "/tmp/redis.default@acme.box.key",
            "/hab/cache/keys/redis.default@acme.box.key"
        ))
    );
    assert!(
        reporter
            .steps()
            .contains(&"Uploading service group key: redis.default@acme".to_string())
    );
}

#[tokio::test]
async fn test_start_service_malformed_key_stops_before_load() {
    let req = request();
    let mut svc = redis();
    svc.service_key = Some("BOX-SEC-1".to_string());
    let channel = MockChannel::linux();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    let err = LinuxStrategy::new(&req)
        .start_service(&exec, &svc)
        .await
        .unwrap_err();

    assert_eq!(label(&err), "configuration");
    assert!(!channel.commands().iter().any(|c| c.contains("svc load")));
}

#[tokio::test]
async fn test_start_service_user_toml_upload_failure_is_fatal() {
    let req = request();
    let channel = MockChannel::linux().fail_upload("user.toml");
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    let err = LinuxStrategy::new(&req)
        .start_service(&exec, &redis())
        .await
        .unwrap_err();

    assert_eq!(label(&err), "upload");
    assert!(!channel.commands().iter().any(|c| c.contains("svc load")));
}
