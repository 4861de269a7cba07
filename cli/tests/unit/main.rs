//! Unit tests for hab-provision
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod linux_strategy;
mod property_tests;
mod windows_strategy;
