//! Terminal reporting for the CLI.
//!
//! Everything goes to stderr. Quiet mode silences all but errors.

use console::{Style, Term};
use diagmark_diagrams::RewriteSummary;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    quiet: bool,
    green: Style,
    yellow: Style,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            quiet: false,
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
        }
    }

    /// Suppress everything except errors.
    #[must_use]
    pub(crate) fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(None, msg);
    }

    /// Print renderer warnings (yellow), one per line.
    pub(crate) fn warnings(&self, warnings: &[String]) {
        for warning in warnings {
            self.line(Some(&self.yellow), warning);
        }
    }

    /// Print the end-of-run summary (green).
    pub(crate) fn summary(&self, summary: &RewriteSummary) {
        self.line(Some(&self.green), &summary_line(summary));
    }

    /// Print an error message (red). Shown even in quiet mode.
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    fn line(&self, style: Option<&Style>, msg: &str) {
        if self.quiet {
            return;
        }
        let _ = match style {
            Some(style) => self.term.write_line(&style.apply_to(msg).to_string()),
            None => self.term.write_line(msg),
        };
    }
}

fn summary_line(summary: &RewriteSummary) -> String {
    let mut line = format!(
        "{} documents scanned, {} rewritten, {} diagrams rendered, {} cache hits",
        summary.documents, summary.rewritten, summary.diagrams.renders, summary.diagrams.cache_hits
    );
    if summary.diagrams.failures > 0 {
        line.push_str(&format!(", {} failed", summary.diagrams.failures));
    }
    line
}
