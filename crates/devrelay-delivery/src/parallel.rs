//! Parallel delivery discipline
//!
//! Discrete events and analytics payloads are independent of one another,
//! so each submission gets its own task. A semaphore bounds how many are
//! on the wire at once; waiting tasks queue on the permit rather than on
//! the channel, so submission itself never blocks. Each envelope gets a
//! fixed number of retries with no backoff, then is logged and dropped.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::{payload::Envelope, transport::EventTransport};

/// Fans independent envelopes out over a bounded set of concurrent sends.
#[derive(Clone)]
pub struct ParallelDispatcher {
    transport: Arc<dyn EventTransport>,
    permits: Arc<Semaphore>,
    runtime: tokio::runtime::Handle,
    max_retries: u32,
}

impl ParallelDispatcher {
    pub fn new(
        transport: Arc<dyn EventTransport>,
        runtime: tokio::runtime::Handle,
        max_parallel: usize,
        max_retries: u32,
    ) -> Self {
        Self {
            transport,
            permits: Arc::new(Semaphore::new(max_parallel.max(1))),
            runtime,
            max_retries,
        }
    }

    /// Submits an envelope for concurrent delivery and returns immediately.
    pub fn dispatch(&self, envelope: Envelope) {
        let transport = Arc::clone(&self.transport);
        let permits = Arc::clone(&self.permits);
        let attempts = self.max_retries + 1;

        self.runtime.spawn(async move {
            // Semaphore is never closed while the dispatcher lives.
            let Ok(_permit) = permits.acquire().await else {
                return;
            };

            for attempt in 1..=attempts {
                match transport.send(&envelope).await {
                    Ok(()) => {
                        debug!(attempt, "Event delivered");
                        return;
                    }
                    Err(e) if attempt < attempts => {
                        debug!(attempt, error = %e, "Event delivery failed, retrying");
                    }
                    Err(e) => {
                        warn!(attempts, error = %e, "Event delivery failed, giving up");
                    }
                }
            }
        });
    }
}
