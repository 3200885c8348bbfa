//! Terminal environment, resolved once per invocation.

use hookwatch_core::RenderOptions;
use is_terminal::IsTerminal;
use terminal_size::{terminal_size, Width};

/// What the output terminal supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermEnv {
    pub is_tty: bool,
    /// A color-suppression signal is present (`NO_COLOR` or `--no-color`).
    pub no_color: bool,
    pub columns: usize,
}

impl TermEnv {
    /// Inspect stdout and the environment.
    pub fn detect(force_no_color: bool, fallback_width: usize) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        let columns = terminal_size()
            .map(|(Width(w), _)| w as usize)
            .filter(|w| *w > 0)
            .unwrap_or(fallback_width);

        Self {
            is_tty,
            no_color: force_no_color || no_color_env,
            columns,
        }
    }

    pub fn color_enabled(&self) -> bool {
        self.is_tty && !self.no_color
    }

    pub fn render_options(&self, show_session: bool, verbose: bool) -> RenderOptions {
        RenderOptions {
            width: self.columns,
            color: self.color_enabled(),
            show_session,
            verbose,
        }
    }
}
