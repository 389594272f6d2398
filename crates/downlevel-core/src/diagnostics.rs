//! Non-fatal findings reported while rewriting a file

use std::fmt;

use serde::Serialize;

/// How much attention a diagnostic deserves
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A construct was deliberately left alone
    Info,
    /// Output needs a human look: an annotated risky expression or a
    /// dropped pending edit
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A finding attributed to the pass that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub pass: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn info(pass: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            pass,
            message: message.into(),
        }
    }

    pub fn warning(pass: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            pass,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.pass, self.message)
    }
}
