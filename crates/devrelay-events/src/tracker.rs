//! Discrete event tracking
//!
//! Named events with flat string properties. An optional `EventSink`
//! receives every event before network submission, giving hosts a local
//! persistence or inspection hook. Submission uses the parallel delivery
//! discipline: independent events, bounded concurrency, retry on failure.

use std::collections::HashMap;
use std::sync::Arc;

use devrelay_delivery::{Envelope, EventPayload, ParallelDispatcher};
use tracing::debug;

/// Receives every tracked event before it is submitted for delivery.
pub trait EventSink: Send + Sync {
    fn store_event(&self, event_name: &str, properties: &HashMap<String, String>);
}

pub struct EventTracker {
    dispatcher: ParallelDispatcher,
    sink: Option<Arc<dyn EventSink>>,
}

impl EventTracker {
    pub fn new(dispatcher: ParallelDispatcher) -> Self {
        Self {
            dispatcher,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Records a named event and submits it for delivery. Returns
    /// immediately; delivery happens in the background.
    pub fn track(&self, event_name: &str, properties: HashMap<String, String>) {
        if let Some(sink) = &self.sink {
            sink.store_event(event_name, &properties);
        }

        debug!(event = event_name, count = properties.len(), "Tracking event");
        for (key, value) in &properties {
            debug!(event = event_name, "  {key}: {value}");
        }

        self.dispatcher
            .dispatch(Envelope::Event(EventPayload::new(event_name, properties)));
    }
}
