//! Human-readable report rendering
//!
//! Builds the bordered text report carried alongside the structured
//! payload and printed to local diagnostics. Pure string assembly;
//! infallible.

use devrelay_core::domain::{Breadcrumb, Issue};

const WIDE_BORDER: usize = 60;
const NARROW_BORDER: usize = 40;

/// Renders a captured issue and a trail snapshot into the report string.
pub fn format_report(issue: &Issue, breadcrumbs: &[Breadcrumb]) -> String {
    let border = "═".repeat(WIDE_BORDER);
    let small_border = "─".repeat(NARROW_BORDER);
    let label = issue.severity.label().to_uppercase();

    let mut report = String::with_capacity(1024);

    report.push('\n');
    report.push_str(&border);
    report.push_str(&format!(
        "\n{label} REPORT [{}] - {}",
        issue.severity.tier(),
        issue.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
    ));
    report.push_str(&format!("\nID: {}", issue.fingerprint));
    report.push_str(&format!("\nThread: {}", issue.origin_thread));
    report.push('\n');
    report.push_str(&border);
    report.push('\n');

    report.push_str(&format!("\n  {}", issue.exception_class));
    if let Some(message) = &issue.message {
        report.push_str(&format!(": {message}"));
    }
    report.push('\n');

    report.push('\n');
    report.push_str(&small_border);
    report.push_str("\n  STACK TRACE:\n");
    if issue.frames.is_empty() {
        report.push_str("  (no backtrace captured)\n");
    }
    for (i, frame) in issue.frames.iter().enumerate() {
        report.push_str(&format!("  {i}: {}\n", frame.raw));
    }

    if !breadcrumbs.is_empty() {
        report.push('\n');
        report.push_str(&small_border);
        report.push_str("\n  RECENT BREADCRUMBS:\n");
        for crumb in breadcrumbs {
            report.push_str(&format!("  {}\n", crumb.display_line()));
        }
    }

    report.push('\n');
    report.push_str(&border);
    report.push_str(&format!("\nEND OF {label} REPORT"));
    report.push('\n');
    report.push_str(&border);
    report.push('\n');

    report
}
