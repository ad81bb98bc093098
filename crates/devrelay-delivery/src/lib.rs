//! DevRelay Delivery - asynchronous transmission to the collector
//!
//! Provides:
//! - `ReportPayload` / `EventPayload`: wire-level representations
//! - `HttpTransport`: the reqwest-backed `EventTransport` implementation
//! - `SerialQueue`: strictly ordered crash/error delivery, no retry
//! - `ParallelDispatcher`: bounded concurrent event delivery with retry
//! - `DeliveryService`: owns the background runtime and both disciplines
//! - `DeliveryReporter`: the default `IssueReporter` implementation
//!
//! Delivery is best-effort and fire-and-forget: callers are never blocked,
//! failures are logged and (on the serial path) dropped, and shutdown does
//! not await in-flight work.

pub mod parallel;
pub mod payload;
pub mod reporter;
pub mod serial;
pub mod service;
pub mod transport;

pub use parallel::ParallelDispatcher;
pub use payload::{DeviceMetadata, Envelope, EventPayload, ReportPayload};
pub use reporter::DeliveryReporter;
pub use serial::SerialQueue;
pub use service::DeliveryService;
pub use transport::{EventTransport, HttpTransport, ProcessTags};
