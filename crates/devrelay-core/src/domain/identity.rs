//! Device identity
//!
//! An opaque identifier for the host machine, tagged with how it was
//! obtained. Resolved once per process and immutable thereafter.

use serde::{Deserialize, Serialize};

/// How a device identifier was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityProvenance {
    /// Read back from a previously persisted identity file.
    Persisted,
    /// Derived from a non-loopback interface hardware address.
    Mac,
    /// Obtained from a platform installation identifier.
    PlatformId,
    /// Built from the current user and hostname.
    Host,
    /// Randomly generated as a last resort.
    Generated,
}

/// A resolved device identifier.
///
/// The value is opaque to the rest of the system; the provenance records
/// which step of the resolution chain produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    value: String,
    provenance: IdentityProvenance,
}

impl DeviceIdentity {
    pub fn new(value: impl Into<String>, provenance: IdentityProvenance) -> Self {
        Self {
            value: value.into(),
            provenance,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn provenance(&self) -> IdentityProvenance {
        self.provenance
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}
