//! Structured compiler remarks scraped from build output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity bucket a diagnostic is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Build error.
    Error,
    /// Build warning.
    Warning,
    /// Informational remark.
    #[default]
    Message,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Message => "message",
        };
        write!(f, "{}", s)
    }
}

/// An immutable record extracted from build output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The matched remark text. Display text and dedup key.
    pub raw_message: String,
    /// Source file the remark points at.
    pub file_path: String,
    /// 1-based line number.
    pub line: u32,
    /// Reason code reported by the compiler.
    pub code: String,
    /// Severity bucket.
    #[serde(default)]
    pub severity: Severity,
}

impl Diagnostic {
    /// Creates an informational diagnostic.
    pub fn new(
        raw_message: impl Into<String>,
        file_path: impl Into<String>,
        line: u32,
        code: impl Into<String>,
    ) -> Self {
        Self {
            raw_message: raw_message.into(),
            file_path: file_path.into(),
            line,
            code: code.into(),
            severity: Severity::Message,
        }
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): [{}] {}", self.file_path, self.line, self.code, self.raw_message)
    }
}
