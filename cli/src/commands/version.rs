//! Version command.

use anyhow::Result;
use serde::Serialize;

use crate::app::AppContext;
use crate::output::json;

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
}

const INFO: VersionInfo = VersionInfo {
    name: "hab-provision",
    version: env!("CARGO_PKG_VERSION"),
};

/// Print the version. Not affected by `--quiet`.
///
/// # Errors
///
/// Returns an error if the JSON document cannot be encoded.
pub fn run(app: &AppContext) -> Result<()> {
    if app.json() {
        return json::print(&INFO);
    }
    println!("{} {}", INFO.name, INFO.version);
    Ok(())
}
