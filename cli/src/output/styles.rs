//! Color palette for terminal output.

use owo_colors::Style;

/// One style per kind of line the provisioner prints.
///
/// `Palette::default()` is uncolored; [`Palette::colored`] is used on a TTY.
#[derive(Default, Clone)]
pub struct Palette {
    pub step: Style,
    pub ok: Style,
    pub warn: Style,
    pub fail: Style,
    /// Remote command output and summary labels.
    pub remote: Style,
    pub heading: Style,
}

impl Palette {
    #[must_use]
    pub fn colored() -> Self {
        Self {
            step: Style::new().cyan(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red().bold(),
            remote: Style::new().dimmed(),
            heading: Style::new().bold(),
        }
    }
}
