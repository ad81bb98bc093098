//! System information collector
//!
//! Gathers a non-identifying description of the host for the startup
//! analytics event. Never includes hostname or username.

use devrelay_delivery::{Envelope, ParallelDispatcher};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Non-identifying host description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub kernel: String,
    pub desktop: String,
    pub arch: String,
}

impl SystemInfo {
    /// Collect system information from the current host.
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            kernel: read_kernel_version(),
            desktop: std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Sends this description as a `system_info` analytics event.
    pub fn announce(&self, dispatcher: &ParallelDispatcher) {
        debug!(os = %self.os, kernel = %self.kernel, "Announcing system info");
        dispatcher.dispatch(Envelope::Analytics {
            subpath: "/device".to_string(),
            body: serde_json::json!({
                "eventType": "system_info",
                "data": {
                    "os": self.os,
                    "kernel": self.kernel,
                    "desktop": self.desktop,
                    "arch": self.arch,
                },
            }),
        });
    }
}

fn read_kernel_version() -> String {
    std::fs::read_to_string("/proc/version")
        .ok()
        .and_then(|v| v.split_whitespace().nth(2).map(String::from))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_system_info() {
        let info = SystemInfo::collect();
        assert_eq!(info.os, "linux");
        assert!(!info.arch.is_empty());
    }

    #[test]
    fn test_system_info_serialization() {
        let info = SystemInfo::collect();
        let json = serde_json::to_string(&info).unwrap();
        let deserialized: SystemInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.os, info.os);
        assert_eq!(deserialized.arch, info.arch);
    }
}
