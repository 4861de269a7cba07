//! Unit tests for the Windows platform strategy.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use hab_common::{ProvisioningRequest, ServiceDeclaration};
use hab_provisioner::application::services::executor::RemoteExecutor;
use hab_provisioner::application::services::platform::{PlatformStrategy, WindowsStrategy};
use hab_provisioner::domain::error::ProvisionError;
use hab_provisioner::domain::templates::{windows_install_script, windows_start_script};

use crate::mocks::{MockChannel, Op, RecordingReporter};

const INSTALL_PATH: &str = "C:/Windows/Temp/win_hab_install.ps1";
const START_PATH: &str = "C:/Windows/Temp/win_hab_start.ps1";

fn request() -> ProvisioningRequest {
    ProvisioningRequest {
        accept_license: true,
        ..ProvisioningRequest::default()
    }
}

#[tokio::test]
async fn test_install_runtime_uploads_and_runs_script() {
    let req = ProvisioningRequest {
        version: Some("1.6.0".to_string()),
        ..request()
    };
    let channel = MockChannel::windows();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    WindowsStrategy::new(&req)
        .install_runtime(&exec)
        .await
        .unwrap();

    assert_eq!(
        channel.ops(),
        vec![
            Op::Script(
                INSTALL_PATH.to_string(),
                windows_install_script(Some("1.6.0"), true)
            ),
            Op::Run(format!(
                "powershell -NoProfile -ExecutionPolicy Bypass -File {INSTALL_PATH}"
            )),
        ]
    );
}

#[tokio::test]
async fn test_install_runtime_script_upload_failure_skips_execution() {
    let req = request();
    let channel = MockChannel::windows().fail_upload("win_hab_install");
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    let err = WindowsStrategy::new(&req)
        .install_runtime(&exec)
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ProvisionError>().unwrap().as_label(),
        "upload"
    );
    assert!(channel.commands().is_empty());
}

#[tokio::test]
async fn test_start_supervisor_rewrites_service_config() {
    let req = ProvisioningRequest {
        peer: Some("10.0.0.1".to_string()),
        ..request()
    };
    let channel = MockChannel::windows();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    let options = WindowsStrategy::new(&req)
        .start_supervisor(&exec)
        .await
        .unwrap();

    assert_eq!(options, "--peer 10.0.0.1");
    assert_eq!(
        channel.ops(),
        vec![
            Op::Script(
                START_PATH.to_string(),
                windows_start_script("--peer 10.0.0.1")
            ),
            Op::Run(format!(
                "powershell -NoProfile -ExecutionPolicy Bypass -File {START_PATH}"
            )),
        ]
    );
}

#[tokio::test]
async fn test_start_supervisor_ignores_service_type() {
    let req = ProvisioningRequest {
        service_type: "upstart".to_string(),
        ..request()
    };
    let channel = MockChannel::windows();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    WindowsStrategy::new(&req)
        .start_supervisor(&exec)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_ring_key_is_unsupported() {
    let req = request();
    let channel = MockChannel::windows();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);
    let strategy = WindowsStrategy::new(&req);

    assert!(!strategy.supports_ring_key());
    let err = strategy
        .upload_ring_key(&exec, "SYM-SEC-1\nprod\n")
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ProvisionError>().unwrap().as_label(),
        "configuration"
    );
    assert!(channel.ops().is_empty());
}

#[tokio::test]
async fn test_start_service_sequence_with_token_and_key() {
    let req = ProvisioningRequest {
        builder_auth_token: Some("tok".to_string()),
        ..request()
    };
    let key = "BOX-SEC-1\nweb.default@acme\n\nc2VjcmV0=";
    let mut svc = ServiceDeclaration::new("acme/web".parse().unwrap());
    svc.group = Some("prod".to_string());
    svc.user_toml = "port = 8080\n".to_string();
    svc.service_key = Some(key.to_string());
    let channel = MockChannel::windows();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    WindowsStrategy::new(&req)
        .start_service(&exec, &svc)
        .await
        .unwrap();

    assert_eq!(
        channel.ops(),
        vec![
            Op::Run(
                "if not exist C:\\hab\\user\\web\\config mkdir C:\\hab\\user\\web\\config"
                    .to_string()
            ),
            Op::Upload(
                "C:\\hab\\user\\web\\config\\user.toml".to_string(),
                "port = 8080\n".to_string()
            ),
            Op::Upload(
                "C:\\hab\\cache\\keys\\web.default@acme.box.key".to_string(),
                key.to_string()
            ),
            Op::Run("set \"HAB_AUTH_TOKEN=tok\" && hab svc load acme/web --group prod".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_start_service_has_no_package_preinstall() {
    let req = request();
    let svc = ServiceDeclaration::new("core/redis".parse().unwrap());
    let channel = MockChannel::windows();
    let reporter = RecordingReporter::default();
    let exec = RemoteExecutor::new(&channel, &reporter);

    WindowsStrategy::new(&req)
        .start_service(&exec, &svc)
        .await
        .unwrap();

    let commands = channel.commands();
    assert!(!commands.iter().any(|c| c.contains("pkg install")));
    assert_eq!(commands.last().unwrap(), "hab svc load core/redis");
}
