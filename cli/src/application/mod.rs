//! The provisioning use case and the ports it drives.
//!
//! Depends on `crate::domain` only.

pub mod ports;
pub mod services;

pub use ports::{CommandRunner, ExitOutcome, ProgressReporter, RemoteChannel, RemoteProcess};
