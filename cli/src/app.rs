//! Per-invocation context handed to every command.

use crate::cli::GlobalArgs;
use crate::output::OutputContext;

pub struct AppContext {
    pub output: OutputContext,
    json: bool,
}

impl AppContext {
    /// `--json` also silences progress output, so stdout carries only the
    /// JSON document.
    #[must_use]
    pub fn new(global: &GlobalArgs) -> Self {
        Self {
            output: OutputContext::new(global.no_color, global.quiet || global.json),
            json: global.json,
        }
    }

    #[must_use]
    pub fn json(&self) -> bool {
        self.json
    }
}
