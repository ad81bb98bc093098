//! DevRelay Events - discrete event tracking and session analytics
//!
//! Provides:
//! - `EventTracker`: named events with string properties, delivered over
//!   the parallel discipline, with an optional local storage seam
//! - `SessionTracker`: user login/logout bookkeeping and session-duration
//!   analytics
//! - `SystemInfo`: non-identifying system description announced at startup
//!
//! Everything here is fire-and-forget: submission never blocks the caller
//! and delivery failures are handled inside the delivery subsystem.

pub mod session;
pub mod system_info;
pub mod tracker;

pub use session::SessionTracker;
pub use system_info::SystemInfo;
pub use tracker::{EventSink, EventTracker};
