//! DevRelay - telemetry client facade
//!
//! The [`DevRelay`] context object wires the sub-systems together: device
//! identity, breadcrumb trail, crash capture, delivery, and event/session
//! analytics. There is no global state; hosts construct a context with
//! [`DevRelay::start`] and call methods on it. Dropping it without
//! [`DevRelay::shutdown`] leaks the background delivery runtime threads
//! for the rest of the process, so long-lived hosts should shut down
//! explicitly.

use std::collections::HashMap;
use std::sync::Arc;

use devrelay_capture::{BreadcrumbTrail, CaptureController, FailureEvent};
use devrelay_core::{DeviceIdentity, IssueReporter, RelayConfig, Severity};
use devrelay_delivery::{DeliveryReporter, DeliveryService, Envelope, ProcessTags};
use devrelay_events::{EventTracker, SessionTracker, SystemInfo};
use devrelay_identity::{IdentityResolver, MachineIdProbe};
use tracing::{debug, info};

/// Which sub-systems a context activates. All on by default.
#[derive(Debug, Clone, Copy)]
pub struct Features {
    /// Session, device and location analytics.
    pub analytics: bool,
    /// Panic interception, watchdog, and crash/error reporting.
    pub crashes: bool,
    /// Discrete named events.
    pub events: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            analytics: true,
            crashes: true,
            events: true,
        }
    }
}

/// One telemetry context. The host owns exactly one per collector.
pub struct DevRelay {
    config: RelayConfig,
    identity: DeviceIdentity,
    trail: Arc<BreadcrumbTrail>,
    controller: CaptureController,
    delivery: DeliveryService,
    tracker: Option<EventTracker>,
    sessions: Option<SessionTracker>,
}

impl DevRelay {
    /// Starts a context with every feature enabled.
    pub fn start(config: RelayConfig) -> anyhow::Result<Self> {
        Self::start_with_features(config, Features::default())
    }

    /// Starts a context with the given feature set.
    ///
    /// Must be called from the host's primary thread when `crashes` is
    /// enabled; that thread is the one the liveness watchdog guards.
    pub fn start_with_features(config: RelayConfig, features: Features) -> anyhow::Result<Self> {
        let resolver = IdentityResolver::new(Arc::new(MachineIdProbe::new()));
        Self::start_with_resolver(config, features, &resolver)
    }

    /// Same as `start_with_features` but with a caller-supplied identity
    /// resolver, for hosts that manage identity storage themselves.
    pub fn start_with_resolver(
        config: RelayConfig,
        features: Features,
        resolver: &IdentityResolver,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let identity = resolver.resolve();
        let trail = Arc::new(BreadcrumbTrail::new());

        let delivery = DeliveryService::start(
            &config,
            ProcessTags {
                device_id: identity.value().to_string(),
                app_id: config.app_id.clone(),
                app_version: config.app_version.clone(),
            },
        )?;

        let serial = config.enable_delivery.then(|| delivery.serial().clone());
        let reporter = Arc::new(DeliveryReporter::new(serial, config.app_version.clone()));

        let controller =
            CaptureController::new(config.clone(), Arc::clone(&trail), reporter as _);
        if features.crashes {
            controller.initialize(delivery.handle())?;
        }

        let submit = config.enable_delivery;
        let tracker =
            (features.events && submit).then(|| EventTracker::new(delivery.parallel().clone()));
        let sessions =
            (features.analytics && submit).then(|| SessionTracker::new(delivery.parallel().clone()));

        let relay = Self {
            config,
            identity,
            trail,
            controller,
            delivery,
            tracker,
            sessions,
        };
        relay.announce_startup(features);

        info!(
            app_id = %relay.config.app_id,
            device_id = %relay.identity.value(),
            "DevRelay started"
        );
        Ok(relay)
    }

    /// Fires the startup analytics: `sdk_initialized`, `app_start`, system
    /// description, and a coarse location.
    fn announce_startup(&self, features: Features) {
        let Some(sessions) = &self.sessions else {
            return;
        };

        self.delivery.parallel().dispatch(Envelope::Analytics {
            subpath: String::new(),
            body: serde_json::json!({
                "eventType": "sdk_initialized",
                "appVersion": self.config.app_version,
                "crashesEnabled": features.crashes,
                "eventsEnabled": features.events,
            }),
        });
        self.delivery.parallel().dispatch(Envelope::Analytics {
            subpath: String::new(),
            body: serde_json::json!({
                "eventType": "app_start",
                "appVersion": self.config.app_version,
            }),
        });
        SystemInfo::collect().announce(self.delivery.parallel());
        sessions.track_location();
    }

    // -----------------------------------------------------------------------
    // Failure capture
    // -----------------------------------------------------------------------

    /// Reports an error value at `Error` severity. Returns `true` when the
    /// failure was processed.
    pub fn capture_error<E: std::error::Error>(&self, err: &E) -> bool {
        self.controller.capture(FailureEvent::from_error(err), Severity::Error)
    }

    /// Reports an error value with a context line and properties, all
    /// recorded as breadcrumbs before the capture so they appear in the
    /// report's recent-activity section.
    pub fn capture_error_with_context<E: std::error::Error>(
        &self,
        err: &E,
        context: &str,
        properties: &HashMap<String, String>,
    ) -> bool {
        self.add_breadcrumb_with_severity(format!("context: {context}"), Severity::Error);
        for (key, value) in properties {
            self.add_breadcrumb_with_severity(format!("{key}: {value}"), Severity::Error);
        }
        self.capture_error(err)
    }

    /// Reports an explicit failure condition without an error value.
    pub fn capture_message(
        &self,
        exception_class: impl Into<String>,
        message: impl Into<String>,
    ) -> bool {
        self.controller
            .capture(FailureEvent::new(exception_class, message), Severity::Error)
    }

    // -----------------------------------------------------------------------
    // Breadcrumbs
    // -----------------------------------------------------------------------

    /// Records an `Info` breadcrumb.
    pub fn add_breadcrumb(&self, text: impl Into<String>) {
        self.add_breadcrumb_with_severity(text, Severity::Info);
    }

    /// Records a breadcrumb at the given severity. Breadcrumbs below the
    /// configured threshold are dropped.
    pub fn add_breadcrumb_with_severity(&self, text: impl Into<String>, severity: Severity) {
        if severity < self.config.severity_threshold {
            return;
        }
        self.trail.record(text, severity);
    }

    // -----------------------------------------------------------------------
    // Events & sessions
    // -----------------------------------------------------------------------

    /// Tracks a named event with no properties.
    pub fn track_event(&self, event_name: &str) {
        self.track_event_with_properties(event_name, HashMap::new());
    }

    /// Tracks a named event with flat string properties.
    pub fn track_event_with_properties(&self, event_name: &str, properties: HashMap<String, String>) {
        match &self.tracker {
            Some(tracker) => tracker.track(event_name, properties),
            None => debug!(event = event_name, "Event tracking inactive, dropped"),
        }
    }

    pub fn set_current_user(&self, user_id: impl Into<String>) {
        if let Some(sessions) = &self.sessions {
            sessions.set_current_user(user_id);
        }
    }

    pub fn user_logged_in(&self) {
        match &self.sessions {
            Some(sessions) => sessions.user_logged_in(),
            None => debug!("Session analytics inactive, login not tracked"),
        }
    }

    pub fn user_logged_out(&self) {
        if let Some(sessions) = &self.sessions {
            sessions.user_logged_out();
        }
    }

    // -----------------------------------------------------------------------
    // Context control
    // -----------------------------------------------------------------------

    /// Replaces the reporter behind the crash/error dispatch seam.
    pub fn set_reporter(&self, reporter: Arc<dyn IssueReporter>) {
        self.controller.set_reporter(reporter);
    }

    /// Shuts the context down. Captures stop immediately; queued and
    /// in-flight deliveries are abandoned, not drained.
    pub fn shutdown(self) {
        self.controller.shutdown();
        self.delivery.shutdown();
        info!("DevRelay shut down");
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn device_id(&self) -> &str {
        self.identity.value()
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    /// `true` while the crash capture pipeline accepts failures.
    pub fn is_active(&self) -> bool {
        self.controller.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_APP_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    fn offline_config() -> RelayConfig {
        RelayConfig::new(VALID_APP_ID, "http://localhost:9").with_delivery_enabled(false)
    }

    fn start_offline(features: Features) -> DevRelay {
        let dir = tempfile::tempdir().unwrap();
        let resolver = IdentityResolver::with_candidates(
            Arc::new(devrelay_core::ports::NoPlatform),
            vec![dir.path().join("id")],
        );
        DevRelay::start_with_resolver(offline_config(), features, &resolver).unwrap()
    }

    #[test]
    fn test_start_rejects_invalid_app_id() {
        let config = RelayConfig::new("nope", "http://localhost:9");
        assert!(DevRelay::start_with_features(config, Features::default()).is_err());
    }

    #[test]
    fn test_offline_context_captures_locally() {
        let relay = start_offline(Features::default());
        assert!(relay.is_active());

        relay.add_breadcrumb("opening database");
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "db missing");
        assert!(relay.capture_error(&err));

        // Delivery disabled: event tracking is inactive but never panics.
        relay.track_event("ignored");
        relay.user_logged_in();
        relay.shutdown();
    }

    #[test]
    fn test_crashes_feature_off_drops_captures() {
        let relay = start_offline(Features {
            crashes: false,
            ..Features::default()
        });
        assert!(!relay.is_active());
        assert!(!relay.capture_message("ConfigError", "missing key"));
        relay.shutdown();
    }

    #[test]
    fn test_breadcrumbs_below_threshold_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = IdentityResolver::with_candidates(
            Arc::new(devrelay_core::ports::NoPlatform),
            vec![dir.path().join("id")],
        );
        let config = offline_config().with_severity_threshold(Severity::Warning);
        let relay =
            DevRelay::start_with_resolver(config, Features::default(), &resolver).unwrap();

        relay.add_breadcrumb("info crumb, below threshold");
        relay.add_breadcrumb_with_severity("warning crumb", Severity::Warning);

        assert_eq!(relay.trail.len(), 1);
        relay.shutdown();
    }

    #[test]
    fn test_accessors_expose_identity() {
        let relay = start_offline(Features::default());
        assert_eq!(relay.app_id(), VALID_APP_ID);
        assert!(!relay.device_id().is_empty());
        relay.shutdown();
    }
}
