//! Identity sources
//!
//! Individual probes consulted by the resolution chain. Each returns
//! `Option<String>`; `None` means "try the next source". All probes read
//! well-known `/sys`, `/proc` and `/etc` files rather than making raw
//! syscalls, and none of them can fail loudly.

use devrelay_core::ports::PlatformProbe;
use tracing::debug;

/// Sentinel machine-id values that indicate an unset identifier.
const MACHINE_ID_SENTINELS: &[&str] = &["", "00000000000000000000000000000000"];

/// Returns the hardware address of the first non-loopback interface as
/// uppercase hex without separators, or `None` if no usable interface
/// exists.
pub fn mac_address() -> Option<String> {
    let entries = std::fs::read_dir("/sys/class/net").ok()?;

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name != "lo")
        .collect();
    // Deterministic pick across process restarts
    names.sort();

    for name in names {
        let path = format!("/sys/class/net/{name}/address");
        let Ok(raw) = std::fs::read_to_string(&path) else {
            continue;
        };
        let hex: String = raw
            .trim()
            .chars()
            .filter(|c| *c != ':')
            .collect::<String>()
            .to_uppercase();

        // Virtual interfaces report an all-zero address
        if hex.is_empty() || hex.chars().all(|c| c == '0') {
            continue;
        }

        debug!(interface = %name, "Using interface hardware address for identity");
        return Some(hex);
    }
    None
}

/// Returns `user@hostname` for the current process, or `None` when the
/// hostname cannot be determined.
pub fn host_identity() -> Option<String> {
    let hostname = std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;

    let user = std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    Some(format!("{user}@{hostname}"))
}

/// Platform probe backed by the systemd machine id.
///
/// Rejects the sentinel values a freshly imaged or containerized system
/// may carry.
pub struct MachineIdProbe {
    path: std::path::PathBuf,
}

impl MachineIdProbe {
    pub fn new() -> Self {
        Self {
            path: std::path::PathBuf::from("/etc/machine-id"),
        }
    }

    /// Probe a specific file instead of `/etc/machine-id` (for tests).
    pub fn with_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for MachineIdProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProbe for MachineIdProbe {
    fn installation_id(&self) -> Option<String> {
        let id = std::fs::read_to_string(&self.path).ok()?.trim().to_string();
        if MACHINE_ID_SENTINELS.contains(&id.as_str()) {
            debug!("Machine id is a sentinel value, treating as unset");
            return None;
        }
        Some(id)
    }
}
