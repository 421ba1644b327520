//! Non-fatal findings collected while interpreting a program.

use serde::Serialize;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Info,
}

/// A diagnostic message tied to a source line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

/// Diagnostics gathered over one or more `process` calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, line: usize, message: String) {
        log::warn!("line {}: {}", line, message);
        self.entries.push(Diagnostic {
            line,
            message,
            severity: Severity::Warning,
        });
    }

    pub fn add_info(&mut self, line: usize, message: String) {
        log::debug!("line {}: {}", line, message);
        self.entries.push(Diagnostic {
            line,
            message,
            severity: Severity::Info,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
