//! Provisioning rules with no I/O: config schema and validation, command
//! construction, generated artifacts, secret redaction, and errors.

pub mod command;
pub mod config;
pub mod error;
pub mod secrets;
pub mod templates;

pub use config::{ConnectionSettings, ProvisionConfig};
pub use error::{ExecFailure, ProvisionError};
