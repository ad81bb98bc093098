//! Port definitions
//!
//! Traits implemented by adapter crates or replaced by the host
//! application.

pub mod platform;
pub mod reporter;

pub use platform::{NoPlatform, PlatformProbe};
pub use reporter::IssueReporter;
