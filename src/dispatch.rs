use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

// 1. WebhookTransport Contract
/// WebhookTransport
///
/// Defines the abstract contract for delivering webhook payloads. This trait
/// lets us swap the concrete implementation—from the real HTTP client
/// (HttpWebhookTransport) in production to the in-memory Mock
/// (MockWebhookTransport) during testing—without affecting the handlers.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Posts `payload` as JSON to `url` and returns the response status code.
    /// Network and timeout failures come back as the Err string.
    async fn deliver(&self, url: &str, payload: &serde_json::Value) -> Result<u16, String>;
}

/// TransportState
///
/// The concrete type used to share the delivery transport across the
/// application state.
pub type TransportState = Arc<dyn WebhookTransport>;

// 2. The Real Implementation (reqwest)
/// HttpWebhookTransport
///
/// The production transport: a plain reqwest client with a short timeout, so
/// a dead endpoint cannot hold a request handler hostage.
#[derive(Clone)]
pub struct HttpWebhookTransport {
    client: reqwest::Client,
}

impl HttpWebhookTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("FATAL: failed to build webhook HTTP client");
        Self { client }
    }
}

impl Default for HttpWebhookTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhookTransport {
    async fn deliver(&self, url: &str, payload: &serde_json::Value) -> Result<u16, String> {
        let response = self
            .client
            .post(url)
            .header("x-gameverse-event", "test")
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(response.status().as_u16())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockWebhookTransport
///
/// Test transport that never touches the network. Records nothing; the
/// handler-visible effects (delivery status on the webhook record) are what
/// tests assert on.
#[derive(Clone)]
pub struct MockWebhookTransport {
    /// When true, all deliveries return a simulated failure.
    pub should_fail: bool,
}

impl MockWebhookTransport {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockWebhookTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookTransport for MockWebhookTransport {
    async fn deliver(&self, _url: &str, _payload: &serde_json::Value) -> Result<u16, String> {
        if self.should_fail {
            return Err("Mock Transport Error: simulation requested".to_string());
        }
        Ok(200)
    }
}
