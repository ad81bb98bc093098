//! DevRelay Identity - device identity resolution
//!
//! Determines a stable device identifier once per process lifetime through
//! a fixed-priority fallback chain:
//!
//! 1. A previously persisted identifier (first candidate file that has one)
//! 2. A non-loopback interface hardware address (`mac_` prefix)
//! 3. A platform installation identifier (`platform_` prefix)
//! 4. The current user and hostname (`host_` prefix)
//! 5. A freshly generated UUID (`uuid_` prefix)
//!
//! Whichever step succeeds is persisted back to every writable candidate
//! path so later processes short-circuit at step 1. Every failure along the
//! way degrades silently; resolution itself can never fail.

pub mod resolver;
pub mod sources;

pub use resolver::IdentityResolver;
pub use sources::MachineIdProbe;
