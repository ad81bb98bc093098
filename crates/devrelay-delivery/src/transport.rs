//! HTTP transport to the collector
//!
//! A typed wrapper over `reqwest::Client`, in the same shape as a typed
//! API client: base-URL construction, JSON bodies, status classification.
//! Any non-2xx response or network error counts as "delivery failed" for
//! retry purposes; the response body is never inspected for backoff
//! signals.

use async_trait::async_trait;
use devrelay_core::RelayConfig;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::payload::Envelope;

const USER_AGENT: &str = concat!("DevRelay/", env!("CARGO_PKG_VERSION"));

/// Process-wide identity stamped onto outgoing payloads and headers.
#[derive(Debug, Clone)]
pub struct ProcessTags {
    pub device_id: String,
    pub app_id: String,
    pub app_version: String,
}

/// Sends one envelope to the collector.
///
/// Serialization happens inside `send`, so a retry re-invokes the full
/// pipeline rather than replaying bytes.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> anyhow::Result<()>;
}

/// The reqwest-backed transport.
pub struct HttpTransport {
    /// Client for crash/error reports (report timeouts).
    report_client: Client,
    /// Client for discrete events and analytics (event timeouts).
    event_client: Client,
    base_url: String,
    tags: ProcessTags,
}

impl HttpTransport {
    /// Builds a transport from the relay configuration.
    ///
    /// Both clients set connect and total-request timeouts so a hung
    /// backend cannot pin background workers indefinitely.
    pub fn new(config: &RelayConfig, tags: ProcessTags) -> anyhow::Result<Self> {
        let report_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        let event_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.event_timeout_secs))
            .timeout(Duration::from_secs(config.event_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            report_client,
            event_client,
            base_url: config.backend_url.clone(),
            tags,
        })
    }

    /// Fills missing identity fields in a JSON body. Payloads must never
    /// leave with a blank `deviceId` or `appId`.
    fn fill_identity(&self, body: &mut Value) {
        if let Some(map) = body.as_object_mut() {
            map.entry("deviceId")
                .or_insert_with(|| Value::String(self.tags.device_id.clone()));
            map.entry("appId")
                .or_insert_with(|| Value::String(self.tags.app_id.clone()));
        }
    }

    async fn post(&self, client: &Client, url: String, body: Value, tagged: bool) -> anyhow::Result<()> {
        let mut request = client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        if tagged {
            request = request
                .header("x-device-id", &self.tags.device_id)
                .header("x-app-id", &self.tags.app_id)
                .header("x-app-version", &self.tags.app_version);
        }

        let response = request.json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("collector returned {status} for {url}");
        }
        debug!(%url, status = status.as_u16(), "Delivery accepted");
        Ok(())
    }
}

#[async_trait]
impl EventTransport for HttpTransport {
    async fn send(&self, envelope: &Envelope) -> anyhow::Result<()> {
        match envelope {
            Envelope::Crash(payload) => {
                let mut body = serde_json::to_value(payload)?;
                self.fill_identity(&mut body);
                let url = format!("{}/crashes", self.base_url);
                self.post(&self.report_client, url, body, false).await
            }
            Envelope::Event(payload) => {
                let mut body = serde_json::to_value(payload)?;
                self.fill_identity(&mut body);
                let url = format!("{}/analytics-event/track", self.base_url);
                self.post(&self.event_client, url, body, true).await
            }
            Envelope::Analytics { subpath, body } => {
                let mut body = body.clone();
                self.fill_identity(&mut body);
                let url = format!("{}/analytics{}", self.base_url, subpath);
                self.post(&self.event_client, url, body, true).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::EventPayload;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_APP_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    fn transport_for(server: &MockServer) -> HttpTransport {
        let config = RelayConfig::new(VALID_APP_ID, server.uri());
        HttpTransport::new(
            &config,
            ProcessTags {
                device_id: "mac_AABBCC".to_string(),
                app_id: VALID_APP_ID.to_string(),
                app_version: "1.0.0".to_string(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_event_sent_with_identity_headers_and_fill() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analytics-event/track"))
            .and(header("x-device-id", "mac_AABBCC"))
            .and(header("x-app-id", VALID_APP_ID))
            .and(body_partial_json(serde_json::json!({
                "eventName": "sync_done",
                "deviceId": "mac_AABBCC",
                "appId": VALID_APP_ID,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let envelope = Envelope::Event(EventPayload::new("sync_done", HashMap::new()));
        transport.send(&envelope).await.unwrap();
    }

    #[tokio::test]
    async fn test_analytics_subpath_routing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analytics/session"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let envelope = Envelope::Analytics {
            subpath: "/session".to_string(),
            body: serde_json::json!({ "eventType": "session_duration" }),
        };
        transport.send(&envelope).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_2xx_is_delivery_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analytics-event/track"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let envelope = Envelope::Event(EventPayload::new("oops", HashMap::new()));
        assert!(transport.send(&envelope).await.is_err());
    }

    #[tokio::test]
    async fn test_existing_identity_not_overwritten() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analytics"))
            .and(body_partial_json(serde_json::json!({
                "deviceId": "explicit-device",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let envelope = Envelope::Analytics {
            subpath: String::new(),
            body: serde_json::json!({ "eventType": "x", "deviceId": "explicit-device" }),
        };
        transport.send(&envelope).await.unwrap();
    }
}
