use std::fmt::Display;

use owo_colors::OwoColorize;

use crate::VERSION;

/// Kind of a one-line status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    Note,
    Warn,
}

impl Status {
    fn marker(self) -> &'static str {
        match self {
            Status::Done => "✓",
            Status::Note => "ℹ",
            Status::Warn => "⚠",
        }
    }
}

/// Print a status line to stderr
pub fn status(kind: Status, message: impl Display) {
    let message = message.to_string();
    match kind {
        Status::Done => eprintln!("{} {}", kind.marker().green(), message.bright_green()),
        Status::Note => eprintln!("{} {}", kind.marker().blue(), message.bright_blue()),
        Status::Warn => eprintln!("{} {}", kind.marker().yellow(), message.bright_yellow()),
    }
}

pub fn print_banner() {
    eprintln!("\n{} {}", "Postscope".bold().bright_blue(), format!("v{}", VERSION).dimmed());
    eprintln!("{}\n", "Feed normalizer and HTML sanitizer".dimmed());
}

/// Numbered progress through a fixed pipeline
///
/// Silent unless verbose, so call sites don't have to branch.
pub struct Steps {
    current: usize,
    total: usize,
    verbose: bool,
}

impl Steps {
    pub fn new(total: usize, verbose: bool) -> Self {
        Self { current: 0, total, verbose }
    }

    /// Start the next stage, closing the previous one with a blank line
    pub fn next(&mut self, message: impl Display) {
        if !self.verbose {
            return;
        }
        if self.current > 0 {
            eprintln!();
        }
        self.current += 1;
        eprintln!(
            "{} {}",
            format!("[{}/{}]", self.current, self.total).dimmed(),
            message.to_string().bright_cyan()
        );
    }

    /// Label and value under the current stage
    pub fn detail(&self, label: &str, value: impl Display) {
        if self.verbose {
            eprintln!("  {} {}", format!("{}:", label).dimmed(), value.to_string().bright_white());
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.verbose {
            status(Status::Warn, message);
        }
    }
}

/// Human readable byte count
pub fn byte_count(bytes: usize) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
