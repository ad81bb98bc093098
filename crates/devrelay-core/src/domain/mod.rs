//! Domain entities for the telemetry client
//!
//! Pure data types shared by the identity, capture and delivery crates.

pub mod breadcrumb;
pub mod errors;
pub mod identity;
pub mod issue;
pub mod severity;

pub use breadcrumb::Breadcrumb;
pub use errors::RelayError;
pub use identity::{DeviceIdentity, IdentityProvenance};
pub use issue::{Issue, StackFrame};
pub use severity::Severity;
