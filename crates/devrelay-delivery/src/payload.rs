//! Wire-level payloads
//!
//! JSON shapes sent to the collector. Field names are camelCase on the
//! wire. Identity fields (`deviceId`, `appId`) are optional here: the
//! transport auto-fills any missing ones from process-wide state
//! immediately before transmission, so they are never sent blank.

use std::collections::HashMap;

use devrelay_core::domain::{Breadcrumb, Issue};
use serde::{Deserialize, Serialize};

/// Device metadata block carried on every crash/error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    #[serde(rename = "deviceManufacturer")]
    pub manufacturer: String,
    #[serde(rename = "deviceModel")]
    pub model: String,
    pub device_type: String,
    pub is_emulator: bool,
    pub os: String,
    pub os_version: String,
}

impl DeviceMetadata {
    /// Collects metadata for the current machine from DMI and `/proc`.
    ///
    /// Missing files (containers, non-x86 boards) degrade to `"unknown"`.
    pub fn detect() -> Self {
        let manufacturer = read_trimmed("/sys/devices/virtual/dmi/id/sys_vendor");
        let model = read_trimmed("/sys/devices/virtual/dmi/id/product_name");

        let lowered = format!("{} {}", manufacturer, model).to_lowercase();
        let is_emulator = ["qemu", "kvm", "virtualbox", "vmware"]
            .iter()
            .any(|marker| lowered.contains(marker));

        Self {
            manufacturer,
            model,
            device_type: if is_emulator {
                "virtual_machine".to_string()
            } else {
                "physical_device".to_string()
            },
            is_emulator,
            os: std::env::consts::OS.to_string(),
            os_version: kernel_version(),
        }
    }
}

fn read_trimmed(path: &str) -> String {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn kernel_version() -> String {
    std::fs::read_to_string("/proc/version")
        .ok()
        .and_then(|v| v.split_whitespace().nth(2).map(String::from))
        .unwrap_or_default()
}

/// Inner `report` object of a crash/error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    /// The full human-readable report.
    pub message: String,
    pub exception_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
    pub stack_trace: Vec<String>,
}

/// The crash/error report as transmitted to `POST /crashes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    #[serde(rename = "type")]
    pub issue_type: String,
    /// Deduplication fingerprint. Advisory metadata for the backend;
    /// submission is never conditional on it.
    pub issue_id: String,
    /// ISO-8601 capture time.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    pub app_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(flatten)]
    pub device: DeviceMetadata,
    pub report: ReportBody,
    /// Snapshot of the breadcrumb trail at formatting time, rendered as
    /// display lines.
    pub breadcrumbs: Vec<String>,
}

impl ReportPayload {
    /// Builds the payload from a captured issue, its formatted report and
    /// a trail snapshot. Identity fields are left for the transport to
    /// fill.
    pub fn from_issue(
        issue: &Issue,
        report: &str,
        breadcrumbs: &[Breadcrumb],
        device: DeviceMetadata,
        app_version: &str,
    ) -> Self {
        Self {
            issue_type: issue.severity.wire_name().to_string(),
            issue_id: issue.fingerprint.clone(),
            timestamp: issue.timestamp.to_rfc3339(),
            app_id: None,
            app_version: app_version.to_string(),
            device_id: None,
            device,
            report: ReportBody {
                message: report.to_string(),
                exception_class: issue.exception_class.clone(),
                exception_message: issue.message.clone(),
                stack_trace: issue.frames.iter().map(|f| f.raw.clone()).collect(),
            },
            breadcrumbs: breadcrumbs.iter().map(|b| b.display_line()).collect(),
        }
    }
}

/// A discrete named event as transmitted to `POST /analytics-event/track`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub properties: HashMap<String, String>,
}

impl EventPayload {
    pub fn new(event_name: impl Into<String>, properties: HashMap<String, String>) -> Self {
        Self {
            event_name: event_name.into(),
            app_id: None,
            device_id: None,
            properties,
        }
    }
}

/// Everything the transport knows how to deliver.
#[derive(Debug, Clone)]
pub enum Envelope {
    /// Crash/error report, serial discipline.
    Crash(ReportPayload),
    /// Discrete named event, parallel discipline.
    Event(EventPayload),
    /// Session/device/location analytics, parallel discipline.
    /// `subpath` is appended to `/analytics` (e.g. `"/session"` or `""`).
    Analytics {
        subpath: String,
        body: serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use devrelay_core::domain::{Severity, StackFrame};

    fn sample_issue() -> Issue {
        Issue {
            severity: Severity::Crash,
            timestamp: Utc::now(),
            origin_thread: "main".to_string(),
            exception_class: "panic".to_string(),
            message: Some("boom".to_string()),
            frames: vec![StackFrame::new("app", "run", "app::run")],
            fingerprint: "ERR-AABBCCDDEEFF".to_string(),
        }
    }

    fn sample_device() -> DeviceMetadata {
        DeviceMetadata {
            manufacturer: "unknown".to_string(),
            model: "unknown".to_string(),
            device_type: "physical_device".to_string(),
            is_emulator: false,
            os: "linux".to_string(),
            os_version: "6.1.0".to_string(),
        }
    }

    #[test]
    fn test_report_payload_wire_shape() {
        let crumbs = vec![Breadcrumb::new("step one", Severity::Info)];
        let payload =
            ReportPayload::from_issue(&sample_issue(), "full report", &crumbs, sample_device(), "1.2.3");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "CRASH");
        assert_eq!(json["issueId"], "ERR-AABBCCDDEEFF");
        assert_eq!(json["appVersion"], "1.2.3");
        // Flattened metadata keys, exactly as the collector expects them
        assert_eq!(json["deviceManufacturer"], "unknown");
        assert_eq!(json["deviceModel"], "unknown");
        assert_eq!(json["deviceType"], "physical_device");
        assert_eq!(json["isEmulator"], false);
        assert_eq!(json["os"], "linux");
        assert_eq!(json["osVersion"], "6.1.0");
        assert!(json.get("manufacturer").is_none());
        assert!(json.get("model").is_none());
        assert_eq!(json["report"]["exceptionClass"], "panic");
        assert_eq!(json["report"]["exceptionMessage"], "boom");
        assert_eq!(json["report"]["stackTrace"][0], "app::run");
        assert!(json["breadcrumbs"][0].as_str().unwrap().contains("step one"));
        // Identity fields absent until the transport fills them
        assert!(json.get("deviceId").is_none());
        assert!(json.get("appId").is_none());
    }

    #[test]
    fn test_event_payload_wire_shape() {
        let mut props = HashMap::new();
        props.insert("screen".to_string(), "settings".to_string());
        let payload = EventPayload::new("button_clicked", props);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["eventName"], "button_clicked");
        assert_eq!(json["properties"]["screen"], "settings");
    }

    #[test]
    fn test_detect_never_fails() {
        let device = DeviceMetadata::detect();
        assert!(!device.manufacturer.is_empty());
        assert_eq!(device.os, "linux");
    }
}
