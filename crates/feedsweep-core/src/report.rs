//! Operator-facing status lines
//!
//! Orchestrators never print directly; they receive a [`Reporter`] and emit
//! one line per terminal or degraded condition. Diagnostics for developers go
//! through `tracing` instead.

use std::sync::Mutex;

use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Heading,
    Info,
    Success,
    Warning,
    Error,
    Plain,
}

pub trait Reporter: Send + Sync {
    fn emit(&self, level: Level, message: &str);

    fn heading(&self, message: &str) {
        self.emit(Level::Heading, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn plain(&self, message: &str) {
        self.emit(Level::Plain, message);
    }
}

/// Styled output on stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn format(level: Level, message: &str) -> String {
        match level {
            Level::Heading => style(message).bold().to_string(),
            Level::Info => format!("{} {}", style("Info:").blue(), message),
            Level::Success => style(format!("Success: {}", message))
                .green()
                .bold()
                .to_string(),
            Level::Warning => style(format!("Warning: {}", message)).yellow().to_string(),
            Level::Error => style(format!("Error: {}", message)).red().bold().to_string(),
            Level::Plain => message.to_string(),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&self, level: Level, message: &str) {
        println!("{}", Self::format(level, message));
    }
}

/// Collects lines in memory; used by tests and embedders
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Messages emitted at `level`, in order
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, level: Level, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}
