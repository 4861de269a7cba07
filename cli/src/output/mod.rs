//! Terminal output for provisioning runs.
//!
//! Progress lines go to stdout and honor `quiet`; errors go to stderr and
//! are always printed.

pub mod json;
pub mod reporter;
pub mod styles;

use std::fmt::Display;

use console::Term;
use owo_colors::{OwoColorize as _, Style};
pub use reporter::TerminalReporter;
pub use styles::Palette;

/// Width of the label column in run summaries.
const LABEL_WIDTH: usize = 20;

pub struct OutputContext {
    pub palette: Palette,
    /// Suppress everything except errors.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors are used only when stdout is a terminal, `no_color` is unset,
    /// and `NO_COLOR` is absent from the environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let colored =
            !no_color && std::env::var_os("NO_COLOR").is_none() && Term::stdout().is_term();
        Self {
            palette: if colored {
                Palette::colored()
            } else {
                Palette::default()
            },
            quiet,
        }
    }

    /// Context that prints nothing but errors.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            palette: Palette::default(),
            quiet: true,
        }
    }

    fn marked(&self, marker: &str, style: Style, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", marker.style(style));
        }
    }

    pub fn step(&self, msg: &str) {
        self.marked("→", self.palette.step, msg);
    }

    pub fn success(&self, msg: &str) {
        self.marked("✓", self.palette.ok, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.marked("!", self.palette.warn, msg);
    }

    /// `Error: {msg}` on stderr, regardless of `quiet`.
    pub fn error(&self, msg: &str) {
        eprintln!("{} {msg}", "Error:".style(self.palette.fail));
    }

    /// One line of remote command output, behind a gutter.
    pub fn remote(&self, line: &str) {
        if !self.quiet {
            println!(
                "    {} {}",
                "│".style(self.palette.remote),
                line.style(self.palette.remote)
            );
        }
    }

    pub fn heading(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.style(self.palette.heading));
        }
    }

    /// Summary row: a padded label followed by `value`.
    pub fn field(&self, label: &str, value: impl Display) {
        if !self.quiet {
            let label = format!("{label:<LABEL_WIDTH$}");
            println!("  {} {value}", label.style(self.palette.remote));
        }
    }
}
