//! Breadcrumbs - timestamped diagnostic notes
//!
//! A breadcrumb is a short, severity-tagged note recorded before a failure.
//! The capture crate keeps a bounded trail of them; a snapshot of the trail
//! rides on every report payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::severity::Severity;

/// A single timestamped diagnostic note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub text: String,
}

impl Breadcrumb {
    /// Creates a breadcrumb stamped with the current time.
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            text: text.into(),
        }
    }

    /// Renders the breadcrumb as a single report line,
    /// e.g. `2026-08-24T10:00:00Z [Info] user tapped sync`.
    pub fn display_line(&self) -> String {
        format!(
            "{} [{}] {}",
            self.timestamp.to_rfc3339(),
            self.severity.label(),
            self.text
        )
    }
}
