use console::style;

/// Styled terminal output for CLI commands.
///
/// Status lines are suppressed with `--quiet`; command results (the refined
/// prompt, rendered config) always print through [`Output::result`].
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
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

    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn section(&self, title: &str) {
        if !self.quiet {
            eprintln!("\n{}", style(title).bold());
            eprintln!("{}", "─".repeat(40));
        }
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: &str) {
        if !self.quiet {
            eprintln!("  {:<18} {}", style(label).dim(), value);
        }
    }

    /// List entry, optionally marked as the active choice
    pub fn item(&self, text: &str, marked: bool) {
        if marked {
            println!("{} {}", style("▶").green(), style(text).green().bold());
        } else {
            println!("  {}", text);
        }
    }

    /// Primary command output on stdout
    pub fn result(&self, text: &str) {
        println!("{}", text);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(false)
    }
}
