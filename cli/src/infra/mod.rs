//! Adapters behind the application ports: local processes, the OpenSSH
//! channel, the recording channel used by `plan`, and config file loading.

pub mod command_runner;
pub mod config;
pub mod dry_run;
pub mod ssh;
