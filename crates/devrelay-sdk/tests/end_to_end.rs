//! Full-stack tests against a mock collector.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use devrelay_core::{ports::NoPlatform, RelayConfig};
use devrelay_identity::IdentityResolver;
use devrelay_sdk::{DevRelay, Features};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALID_APP_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn start_relay(server: &MockServer, dir: &tempfile::TempDir, features: Features) -> DevRelay {
    init_tracing();
    let resolver = IdentityResolver::with_candidates(
        Arc::new(NoPlatform),
        vec![dir.path().join("devrelay_device_id")],
    );
    let config = RelayConfig::new(VALID_APP_ID, server.uri());
    DevRelay::start_with_resolver(config, features, &resolver).unwrap()
}

#[tokio::test]
async fn test_repeated_failures_share_one_issue_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/crashes"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let relay = start_relay(
        &server,
        &dir,
        Features {
            analytics: false,
            crashes: true,
            events: false,
        },
    );

    // Same failure site, different volatile values in the message.
    assert!(relay.capture_message("CacheCorruption", "offset=4096 slot=12"));
    assert!(relay.capture_message("CacheCorruption", "offset=8192 slot=3"));

    tokio::time::sleep(Duration::from_millis(600)).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let first: serde_json::Value = requests[0].body_json().unwrap();
    let second: serde_json::Value = requests[1].body_json().unwrap();

    // Both are submitted; the shared fingerprint is what lets the backend
    // collapse them.
    assert_eq!(first["issueId"], second["issueId"]);
    assert!(first["issueId"].as_str().unwrap().starts_with("ERR-"));
    assert_eq!(first["type"], "ERROR");
    assert_eq!(first["deviceId"], second["deviceId"]);

    relay.shutdown();
}

#[tokio::test]
async fn test_breadcrumbs_travel_with_the_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/crashes"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let relay = start_relay(
        &server,
        &dir,
        Features {
            analytics: false,
            crashes: true,
            events: false,
        },
    );

    relay.add_breadcrumb("opening settings screen");
    let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "settings locked");
    let mut props = HashMap::new();
    props.insert("screen".to_string(), "settings".to_string());
    assert!(relay.capture_error_with_context(&err, "loading preferences", &props));

    tokio::time::sleep(Duration::from_millis(600)).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();

    let breadcrumbs: Vec<String> = body["breadcrumbs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b.as_str().unwrap().to_string())
        .collect();
    assert!(breadcrumbs.iter().any(|b| b.contains("opening settings screen")));
    assert!(breadcrumbs.iter().any(|b| b.contains("loading preferences")));
    assert!(breadcrumbs.iter().any(|b| b.contains("screen: settings")));
    assert_eq!(body["report"]["exceptionMessage"], "settings locked");

    relay.shutdown();
}

#[tokio::test]
async fn test_events_and_sessions_reach_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analytics-event/track"))
        .and(header_exists("x-device-id"))
        .and(header_exists("x-app-id"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analytics"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analytics/device"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analytics/session"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let relay = start_relay(
        &server,
        &dir,
        Features {
            analytics: true,
            crashes: false,
            events: true,
        },
    );

    let mut props = HashMap::new();
    props.insert("plan".to_string(), "pro".to_string());
    relay.track_event_with_properties("subscription_opened", props);

    relay.set_current_user("user-7");
    relay.user_logged_in();
    relay.user_logged_out();

    tokio::time::sleep(Duration::from_millis(800)).await;

    let requests = server.received_requests().await.unwrap();

    let event_bodies: Vec<serde_json::Value> = requests
        .iter()
        .filter(|r| r.url.path() == "/analytics-event/track")
        .map(|r| r.body_json().unwrap())
        .collect();
    assert_eq!(event_bodies.len(), 1);
    assert_eq!(event_bodies[0]["eventName"], "subscription_opened");
    assert_eq!(event_bodies[0]["properties"]["plan"], "pro");
    assert_eq!(event_bodies[0]["appId"], VALID_APP_ID);

    let analytics_types: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/analytics") && r.url.path() != "/analytics-event/track")
        .map(|r| r.body_json::<serde_json::Value>().unwrap()["eventType"]
            .as_str()
            .unwrap()
            .to_string())
        .collect();
    for expected in ["sdk_initialized", "app_start", "user_login", "user_logout", "session_duration"] {
        assert!(
            analytics_types.iter().any(|t| t == expected),
            "missing analytics event {expected}, got {analytics_types:?}"
        );
    }

    relay.shutdown();
}

#[tokio::test]
async fn test_identity_persists_across_contexts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let features = Features {
        analytics: false,
        crashes: false,
        events: false,
    };

    let first = start_relay(&server, &dir, features);
    let original = first.device_id().to_string();
    first.shutdown();

    let second = start_relay(&server, &dir, features);
    assert_eq!(second.device_id(), original);
    second.shutdown();
}
