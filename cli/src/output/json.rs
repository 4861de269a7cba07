//! Documents printed in `--json` mode.

use anyhow::{Context, Result};
use serde::Serialize;

/// Printed on stdout when a command fails in `--json` mode.
#[derive(Serialize)]
struct ErrorDocument<'a> {
    error: bool,
    message: &'a str,
    /// Stable label of the failure class, e.g. `execution`.
    code: &'a str,
}

/// Render the error document for a failed command.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    encode(&ErrorDocument {
        error: true,
        message,
        code,
    })
}

/// Print `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", encode(value)?);
    Ok(())
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("cannot encode JSON output")
}
