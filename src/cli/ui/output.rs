use console::style;
use std::path::Path;

pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Suppress everything but errors and results
    pub fn quiet(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// One settings file line: label, presence mark, path
    pub fn path_entry(&self, label: &str, path: &Path, exists: bool) {
        let mark = if exists {
            style("✓").green()
        } else {
            style("✗").dim()
        };
        println!("  {:<9} {} {}", format!("{}:", label), mark, path.display());
    }

    /// Command result on stdout, never suppressed
    pub fn result(&self, rendered: &str) {
        println!("{}", rendered.trim_end());
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
