//! DevRelay Core - Domain types and business rules
//!
//! This crate contains the dependency-free core of the DevRelay telemetry
//! client:
//! - **Domain entities** - `Severity`, `Breadcrumb`, `Issue`, `StackFrame`,
//!   `DeviceIdentity`
//! - **Configuration** - `RelayConfig` with validation and YAML loading
//! - **Port definitions** - Traits implemented by adapter crates:
//!   `IssueReporter`, `PlatformProbe`
//!
//! # Architecture
//!
//! DevRelay follows a ports & adapters layout. This crate holds pure domain
//! logic with no I/O; the identity, capture and delivery crates implement
//! the ports and perform the actual side effects.

pub mod config;
pub mod domain;
pub mod ports;

pub use config::RelayConfig;
pub use domain::{
    Breadcrumb, DeviceIdentity, IdentityProvenance, Issue, RelayError, Severity, StackFrame,
};
pub use ports::{IssueReporter, PlatformProbe};
