//! Test doubles shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;

use crate::auth::MemoryTokenStorage;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::ports::{
    HttpTransport, Navigator, TokenRefresher, TransportError, TransportRequest, TransportResponse,
};

pub const TEST_BASE_URL: &str = "http://api.test/v1";

/// Transport that replays scripted outcomes in order and records every request.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    sent: Mutex<Vec<(Instant, TransportRequest)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.respond_raw(status, &body.to_string())
    }

    pub fn respond_raw(self, status: u16, body: &str) -> Self {
        self.script
            .lock()
            .push_back(Ok(TransportResponse::new(status, body.as_bytes())));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.sent.lock().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn send_times(&self) -> Vec<Instant> {
        self.sent.lock().iter().map(|(t, _)| *t).collect()
    }
}

impl HttpTransport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.sent.lock().push((Instant::now(), request));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}

/// Navigator that remembers every redirect.
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.redirects.lock().push(path.to_string());
    }
}

/// A client wired to in-memory collaborators.
pub struct Harness {
    pub client: Arc<ApiClient<MockTransport>>,
    pub transport: Arc<MockTransport>,
    pub storage: Arc<MemoryTokenStorage>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(transport: MockTransport) -> Self {
        Self::build(transport, None)
    }

    pub fn with_refresher(transport: MockTransport, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self::build(transport, Some(refresher))
    }

    #[allow(clippy::expect_used)]
    fn build(transport: MockTransport, refresher: Option<Arc<dyn TokenRefresher>>) -> Self {
        let transport = Arc::new(transport);
        let storage = Arc::new(MemoryTokenStorage::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let mut client = ApiClient::new(
            transport.clone(),
            storage.clone(),
            navigator.clone(),
            ClientConfig::with_base_url(TEST_BASE_URL),
        )
        .expect("test config is valid");
        if let Some(refresher) = refresher {
            client = client.with_refresher(refresher);
        }

        Self {
            client: Arc::new(client),
            transport,
            storage,
            navigator,
        }
    }
}
