//! Issue severity levels
//!
//! An ordered scale from `Debug` up to `Crash`. The display label and the
//! criticality tier are presentation metadata only; routing decisions are
//! never based on them.

use serde::{Deserialize, Serialize};

/// Severity of a breadcrumb or a captured issue.
///
/// Ordering follows declaration order: `Debug < Info < Warning < Error < Crash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Crash,
}

impl Severity {
    /// Human-readable label used in formatted reports.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Debug => "Debug",
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Crash => "Crash",
        }
    }

    /// Criticality tier shown alongside the label. Presentation only.
    pub fn tier(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "LOW",
            Severity::Warning => "MEDIUM",
            Severity::Error => "HIGH",
            Severity::Crash => "CRITICAL",
        }
    }

    /// Wire name used in the `type` field of report payloads.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Crash => "CRASH",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
