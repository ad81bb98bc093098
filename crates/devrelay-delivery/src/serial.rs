//! Serial delivery discipline
//!
//! All crash/error reports flow through a single-concurrency worker so
//! they reach the wire strictly in capture order; a slow request can
//! delay, but never reorder or interleave, later reports. No retry: a
//! failed delivery is logged and dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    payload::{Envelope, ReportPayload},
    transport::EventTransport,
};

/// Handle to the serial crash/error delivery worker.
///
/// `enqueue` is synchronous and non-blocking, callable from a panic hook.
/// Dropping every handle closes the channel and stops the worker after it
/// drains what was already queued.
#[derive(Clone)]
pub struct SerialQueue {
    tx: mpsc::UnboundedSender<ReportPayload>,
}

impl SerialQueue {
    /// Starts the worker task on `runtime` and returns the enqueue handle.
    pub fn start(
        transport: Arc<dyn EventTransport>,
        runtime: &tokio::runtime::Handle,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ReportPayload>();

        runtime.spawn(async move {
            while let Some(payload) = rx.recv().await {
                let issue_id = payload.issue_id.clone();
                match transport.send(&Envelope::Crash(payload)).await {
                    Ok(()) => debug!(%issue_id, "Crash report delivered"),
                    Err(e) => {
                        warn!(%issue_id, error = %e, "Crash report delivery failed, dropping")
                    }
                }
            }
            debug!("Serial delivery worker stopped");
        });

        Self { tx }
    }

    /// Queues a report for ordered transmission. Returns `false` when the
    /// worker is gone (service shut down).
    pub fn enqueue(&self, payload: ReportPayload) -> bool {
        self.tx.send(payload).is_ok()
    }
}
