//! DevRelay Capture - the failure capture pipeline
//!
//! Provides:
//! - `BreadcrumbTrail`: bounded, thread-safe trail of recent diagnostics
//! - `fingerprint`: deterministic deduplication key for failures
//! - `format_report`: human-readable report rendering
//! - `FailureEvent`: a captured failure (panic, error value, or explicit)
//! - `CaptureController`: process-wide panic interception, primary-thread
//!   watchdog, and orchestration of the pipeline
//!
//! Everything on the capture path is exception-safe: an internal error
//! while handling a failure is logged locally and never propagated, so
//! telemetry can never crash the host or suppress chained panic hooks.

pub mod controller;
pub mod failure;
pub mod fingerprint;
pub mod report;
pub mod trail;

pub use controller::CaptureController;
pub use failure::FailureEvent;
pub use fingerprint::fingerprint;
pub use report::format_report;
pub use trail::BreadcrumbTrail;
