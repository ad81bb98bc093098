//! Issues - the unit of reporting
//!
//! An [`Issue`] is one failure occurrence: what went wrong, where, on which
//! thread, and under which deduplication fingerprint. Fingerprints are
//! derived by the capture crate, never assigned by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::severity::Severity;

/// One frame of a captured call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Module / type path portion of the symbol (may be empty).
    pub module: String,
    /// Function or method name.
    pub function: String,
    /// The frame as originally captured, for display.
    pub raw: String,
}

impl StackFrame {
    pub fn new(
        module: impl Into<String>,
        function: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            raw: raw.into(),
        }
    }

    /// `module.function` form used by the fingerprint generator.
    pub fn qualified_name(&self) -> String {
        if self.module.is_empty() {
            self.function.clone()
        } else {
            format!("{}.{}", self.module, self.function)
        }
    }
}

/// A single failure occurrence ready to be formatted and delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    /// Name of the thread the failure was observed on.
    pub origin_thread: String,
    /// Type name of the underlying failure (error type, panic, ...).
    pub exception_class: String,
    /// Message attached to the failure, when one exists.
    pub message: Option<String>,
    pub frames: Vec<StackFrame>,
    /// Deduplication key. Derived from class, frame shape and normalized
    /// message; two structurally equivalent failures share one fingerprint.
    pub fingerprint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let frame = StackFrame::new("app::sync", "run_cycle", "app::sync::run_cycle");
        assert_eq!(frame.qualified_name(), "app::sync.run_cycle");
    }

    #[test]
    fn test_qualified_name_without_module() {
        let frame = StackFrame::new("", "main", "main");
        assert_eq!(frame.qualified_name(), "main");
    }
}
