//! Terminal implementation of the `ProgressReporter` port.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Numbers each step of a run (`→ [3] Starting service: core/redis`) and
/// prints remote output under it.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    steps: AtomicUsize,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            steps: AtomicUsize::new(0),
        }
    }

    /// Steps reported so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        let n = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        self.ctx.step(&format!("[{n}] {message}"));
    }

    fn success(&self, message: &str) {
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        self.ctx.warn(message);
    }

    fn output(&self, line: &str) {
        self.ctx.remote(line);
    }
}
