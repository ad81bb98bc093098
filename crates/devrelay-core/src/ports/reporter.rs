//! Reporter port - the replaceable dispatch seam
//!
//! Every captured failure ends up in exactly one of these two calls. The
//! default implementation hands reports to the delivery subsystem; host
//! applications may install their own reporter to redirect or suppress
//! reporting entirely.

use crate::domain::{Breadcrumb, Issue};

/// Receives formatted reports for captured failures.
///
/// `breadcrumbs` is the trail snapshot the report was formatted from;
/// reporters must use it rather than re-reading the trail, so the
/// structured payload always matches the report text exactly.
///
/// Implementations must be callable from arbitrary threads, including the
/// panic-hook path, so both methods are synchronous and must not block on
/// network I/O. They must also never panic; a reporter failure would
/// otherwise suppress the chained host-level failure handling.
pub trait IssueReporter: Send + Sync {
    /// Called for `Crash`-severity issues.
    fn report_crash(&self, report: &str, issue: &Issue, breadcrumbs: &[Breadcrumb]);

    /// Called for every non-crash issue.
    fn report_error(&self, report: &str, issue: &Issue, breadcrumbs: &[Breadcrumb]);
}
