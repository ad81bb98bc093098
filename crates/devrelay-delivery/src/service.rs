//! Delivery service
//!
//! Owns the background tokio runtime so the rest of the pipeline can stay
//! synchronous: panic hooks and capture paths enqueue work and return.
//! Shutdown abandons the runtime without draining; anything still queued
//! or in flight is lost, which is acceptable for best-effort telemetry.

use std::sync::Arc;

use devrelay_core::RelayConfig;
use tracing::{debug, info};

use crate::{
    parallel::ParallelDispatcher,
    serial::SerialQueue,
    transport::{EventTransport, HttpTransport, ProcessTags},
};

pub struct DeliveryService {
    runtime: tokio::runtime::Runtime,
    serial: SerialQueue,
    parallel: ParallelDispatcher,
}

impl DeliveryService {
    /// Builds the HTTP transport and starts both delivery disciplines on a
    /// dedicated runtime.
    pub fn start(config: &RelayConfig, tags: ProcessTags) -> anyhow::Result<Self> {
        let transport: Arc<dyn EventTransport> = Arc::new(HttpTransport::new(config, tags)?);
        Self::start_with_transport(config, transport)
    }

    /// Same as `start` but with a caller-supplied transport.
    pub fn start_with_transport(
        config: &RelayConfig,
        transport: Arc<dyn EventTransport>,
    ) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("devrelay-delivery")
            .enable_all()
            .build()?;

        let serial = SerialQueue::start(Arc::clone(&transport), runtime.handle());
        let parallel = ParallelDispatcher::new(
            transport,
            runtime.handle().clone(),
            config.max_parallel_deliveries,
            config.max_event_retries,
        );

        info!(backend = %config.backend_url, "Delivery service started");
        Ok(Self {
            runtime,
            serial,
            parallel,
        })
    }

    pub fn handle(&self) -> &tokio::runtime::Handle {
        self.runtime.handle()
    }

    pub fn serial(&self) -> &SerialQueue {
        &self.serial
    }

    pub fn parallel(&self) -> &ParallelDispatcher {
        &self.parallel
    }

    /// Stops the service without waiting for queued or in-flight work.
    pub fn shutdown(self) {
        debug!("Delivery service shutting down, in-flight work abandoned");
        self.runtime.shutdown_background();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Envelope, EventPayload};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingTransport {
        sent: AtomicU32,
    }

    #[async_trait::async_trait]
    impl EventTransport for CountingTransport {
        async fn send(&self, _envelope: &Envelope) -> anyhow::Result<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_service_runs_without_ambient_runtime() {
        let config = RelayConfig::new("0f8fad5b-d9cb-469f-a165-70867728950e", "http://localhost:9");
        let transport = Arc::new(CountingTransport {
            sent: AtomicU32::new(0),
        });
        let service =
            DeliveryService::start_with_transport(&config, Arc::clone(&transport) as _).unwrap();

        // Plain synchronous thread, no tokio context.
        service
            .parallel()
            .dispatch(Envelope::Event(EventPayload::new("e", HashMap::new())));
        std::thread::sleep(Duration::from_millis(200));

        assert_eq!(transport.sent.load(Ordering::SeqCst), 1);
        service.shutdown();
    }

    #[test]
    fn test_shutdown_does_not_block_on_queued_work() {
        struct SlowTransport;

        #[async_trait::async_trait]
        impl EventTransport for SlowTransport {
            async fn send(&self, _envelope: &Envelope) -> anyhow::Result<()> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }

        let config = RelayConfig::new("0f8fad5b-d9cb-469f-a165-70867728950e", "http://localhost:9");
        let service = DeliveryService::start_with_transport(&config, Arc::new(SlowTransport)).unwrap();
        service
            .parallel()
            .dispatch(Envelope::Event(EventPayload::new("e", HashMap::new())));

        let started = std::time::Instant::now();
        service.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
