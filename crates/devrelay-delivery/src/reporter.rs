//! Default issue reporter
//!
//! Logs every report through `tracing` and, when delivery is enabled,
//! queues it on the serial path. The payload is built from the breadcrumb
//! snapshot handed in with the report, never from a fresh trail read, so
//! the structured `breadcrumbs[]` always matches the report text. Both
//! `IssueReporter` methods stay synchronous: building the payload is cheap
//! and `enqueue` is a channel send, so this is safe to call from a panic
//! hook.

use devrelay_core::{
    domain::{Breadcrumb, Issue, Severity},
    ports::IssueReporter,
};
use tracing::{error, warn};

use crate::{
    payload::{DeviceMetadata, ReportPayload},
    serial::SerialQueue,
};

pub struct DeliveryReporter {
    serial: Option<SerialQueue>,
    device: DeviceMetadata,
    app_version: String,
}

impl DeliveryReporter {
    /// `serial` is `None` when delivery is disabled; reports are then only
    /// logged.
    pub fn new(serial: Option<SerialQueue>, app_version: impl Into<String>) -> Self {
        Self {
            serial,
            device: DeviceMetadata::detect(),
            app_version: app_version.into(),
        }
    }

    fn deliver(&self, report: &str, issue: &Issue, breadcrumbs: &[Breadcrumb]) {
        let Some(serial) = &self.serial else {
            return;
        };
        let payload = ReportPayload::from_issue(
            issue,
            report,
            breadcrumbs,
            self.device.clone(),
            &self.app_version,
        );
        if !serial.enqueue(payload) {
            warn!(fingerprint = %issue.fingerprint, "Delivery stopped, report discarded");
        }
    }
}

impl IssueReporter for DeliveryReporter {
    fn report_crash(&self, report: &str, issue: &Issue, breadcrumbs: &[Breadcrumb]) {
        error!(
            fingerprint = %issue.fingerprint,
            thread = %issue.origin_thread,
            "\n{report}"
        );
        self.deliver(report, issue, breadcrumbs);
    }

    fn report_error(&self, report: &str, issue: &Issue, breadcrumbs: &[Breadcrumb]) {
        match issue.severity {
            Severity::Error => error!(
                fingerprint = %issue.fingerprint,
                thread = %issue.origin_thread,
                "\n{report}"
            ),
            _ => warn!(
                fingerprint = %issue.fingerprint,
                thread = %issue.origin_thread,
                "\n{report}"
            ),
        }
        self.deliver(report, issue, breadcrumbs);
    }
}
