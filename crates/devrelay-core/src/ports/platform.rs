//! Platform capability probe
//!
//! Some hosts expose a stable installation identifier (for example
//! `/etc/machine-id` on systemd Linux). Rather than scattering optional
//! platform lookups through the identity logic, the probe is resolved once
//! at startup and handed to the resolver as a trait object.

/// Optional provider of a platform-specific installation identifier.
pub trait PlatformProbe: Send + Sync {
    /// Returns the installation identifier, if this platform has one.
    ///
    /// Implementations must reject known placeholder values that indicate
    /// an unset identifier and return `None` instead.
    fn installation_id(&self) -> Option<String>;
}

/// A probe for platforms without any installation identifier.
pub struct NoPlatform;

impl PlatformProbe for NoPlatform {
    fn installation_id(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_platform_returns_none() {
        assert_eq!(NoPlatform.installation_id(), None);
    }
}
