//! Provisioning services: the orchestrator, the per-OS strategies, and the
//! executor they share. Remote access goes through `crate::application::ports`.

pub mod executor;
pub mod platform;
pub mod provision;
