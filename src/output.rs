//! Colored terminal output utilities.

use console::{Style, Term};

/// Diagnostics printed to stderr.
pub(crate) struct Output {
    term: Term,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            red: Style::new().red().for_stderr(),
        }
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}
