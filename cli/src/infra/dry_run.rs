//! Recording `RemoteChannel` used by `plan`.
//!
//! Never touches a host: every command succeeds with no output and every
//! operation is appended to an in-memory log.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use futures::FutureExt;
use serde::Serialize;

use crate::application::ports::{ExitOutcome, RemoteChannel, RemoteProcess};

/// One remote operation the run would perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Connect,
    Command { command: String },
    Upload { destination: String, content: String },
    UploadScript { destination: String, content: String },
    Disconnect,
}

pub struct RecordingChannel {
    target: String,
    script_path: String,
    operations: Mutex<Vec<Operation>>,
}

impl RecordingChannel {
    #[must_use]
    pub fn new(target: impl Into<String>, script_path: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            script_path: script_path.into(),
            operations: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, op: Operation) {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }

    /// Operations recorded so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RemoteChannel for RecordingChannel {
    fn describe(&self) -> String {
        self.target.clone()
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn script_path(&self) -> &str {
        &self.script_path
    }

    async fn connect(&self) -> Result<()> {
        self.record(Operation::Connect);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.record(Operation::Disconnect);
        Ok(())
    }

    async fn start(&self, command: &str) -> Result<RemoteProcess> {
        self.record(Operation::Command {
            command: command.to_string(),
        });
        Ok(RemoteProcess {
            stdout: Box::new(tokio::io::empty()),
            stderr: Box::new(tokio::io::empty()),
            exit: futures::future::ready(Ok(ExitOutcome { code: Some(0) })).boxed(),
        })
    }

    async fn upload(&self, destination: &str, content: &[u8]) -> Result<()> {
        self.record(Operation::Upload {
            destination: destination.to_string(),
            content: String::from_utf8_lossy(content).into_owned(),
        });
        Ok(())
    }

    async fn upload_script(&self, destination: &str, content: &[u8]) -> Result<()> {
        self.record(Operation::UploadScript {
            destination: destination.to_string(),
            content: String::from_utf8_lossy(content).into_owned(),
        });
        Ok(())
    }
}
