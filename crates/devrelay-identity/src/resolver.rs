//! Identity resolution chain
//!
//! The [`IdentityResolver`] walks a fixed-priority list of identity sources
//! and memoizes the first success for the rest of the process lifetime.
//! First success short-circuits everything after it; there is no voting.

use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use devrelay_core::{
    domain::{DeviceIdentity, IdentityProvenance},
    ports::PlatformProbe,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::sources;

/// File name used for the persisted identifier in every candidate
/// directory.
const ID_FILE_NAME: &str = "devrelay_device_id";

/// Resolves and memoizes the device identity for this process.
pub struct IdentityResolver {
    /// Candidate locations for the persisted identity file, in priority
    /// order.
    candidates: Vec<PathBuf>,
    /// Platform installation-id probe, resolved once at startup.
    probe: Arc<dyn PlatformProbe>,
    resolved: OnceLock<DeviceIdentity>,
}

impl IdentityResolver {
    /// Creates a resolver with the default candidate paths: the current
    /// directory, the user's home directory, and the system temp
    /// directory.
    pub fn new(probe: Arc<dyn PlatformProbe>) -> Self {
        let mut candidates = vec![PathBuf::from(ID_FILE_NAME)];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(ID_FILE_NAME));
        }
        candidates.push(std::env::temp_dir().join(ID_FILE_NAME));

        Self {
            candidates,
            probe,
            resolved: OnceLock::new(),
        }
    }

    /// Creates a resolver with explicit candidate paths (for tests).
    pub fn with_candidates(probe: Arc<dyn PlatformProbe>, candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            probe,
            resolved: OnceLock::new(),
        }
    }

    /// Returns the device identity, resolving it on first call.
    ///
    /// Never fails: the chain bottoms out at a generated UUID. Safe to call
    /// from any thread; after the first resolution completes the value is
    /// immutable.
    pub fn resolve(&self) -> DeviceIdentity {
        self.resolved.get_or_init(|| self.resolve_uncached()).clone()
    }

    /// Returns the identity only if it has already been resolved.
    pub fn peek(&self) -> Option<DeviceIdentity> {
        self.resolved.get().cloned()
    }

    fn resolve_uncached(&self) -> DeviceIdentity {
        // 1. Previously persisted identifier
        if let Some(value) = self.read_persisted() {
            info!(device_id = %value, "Using persisted device identity");
            return DeviceIdentity::new(value, IdentityProvenance::Persisted);
        }

        // 2. Interface hardware address
        if let Some(mac) = sources::mac_address() {
            let value = format!("mac_{mac}");
            self.persist(&value);
            info!(device_id = %value, "Using hardware address device identity");
            return DeviceIdentity::new(value, IdentityProvenance::Mac);
        }

        // 3. Platform installation identifier
        if let Some(id) = self.probe.installation_id() {
            let value = format!("platform_{id}");
            self.persist(&value);
            info!(device_id = %value, "Using platform installation identity");
            return DeviceIdentity::new(value, IdentityProvenance::PlatformId);
        }

        // 4. User and hostname
        if let Some(host) = sources::host_identity() {
            let value = format!("host_{host}");
            self.persist(&value);
            info!(device_id = %value, "Using host device identity");
            return DeviceIdentity::new(value, IdentityProvenance::Host);
        }

        // 5. Last resort: random identifier
        let value = format!("uuid_{}", Uuid::new_v4());
        self.persist(&value);
        info!(device_id = %value, "Generated new device identity");
        DeviceIdentity::new(value, IdentityProvenance::Generated)
    }

    /// Returns the first non-empty first line found among the candidate
    /// files.
    fn read_persisted(&self) -> Option<String> {
        for path in &self.candidates {
            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };
            if let Some(line) = content.lines().next() {
                let line = line.trim();
                if !line.is_empty() {
                    debug!(path = %path.display(), "Read persisted device identity");
                    return Some(line.to_string());
                }
            }
        }
        None
    }

    /// Best-effort write of the identity to every candidate path.
    ///
    /// Write failures are expected (read-only install dirs, missing home)
    /// and swallowed; with no writable path the identity simply stays
    /// transient for this process.
    fn persist(&self, value: &str) {
        let mut written = 0usize;
        for path in &self.candidates {
            match std::fs::write(path, value) {
                Ok(()) => written += 1,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Could not persist device identity")
                }
            }
        }
        if written == 0 {
            debug!("No writable candidate path, device identity is transient");
        }
    }
}
