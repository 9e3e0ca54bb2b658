//! End-to-end tests of the API client over real HTTP.
//!
//! Each test runs the reqwest transport against a local mock backend.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use lyceum_application::config::ClientConfig;
use lyceum_application::ports::TokenStorage;
use lyceum_application::{ApiClient, AuthService, SubjectService};
use lyceum_domain::{ApiError, Credentials, LoginRequest, Subject};
use lyceum_infrastructure::{ChannelNavigator, MemoryTokenStorage, ReqwestTransport};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Backend {
    server: MockServer,
    client: Arc<ApiClient<ReqwestTransport>>,
    storage: Arc<MemoryTokenStorage>,
    redirects: UnboundedReceiver<String>,
}

impl Backend {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let storage = Arc::new(MemoryTokenStorage::new());
        let (navigator, redirects) = ChannelNavigator::new();
        let config =
            ClientConfig::with_base_url(format!("{}/api/v1", server.uri())).with_retry(3, 10);
        let client = ApiClient::new(
            Arc::new(ReqwestTransport::new().unwrap()),
            storage.clone(),
            Arc::new(navigator),
            config,
        )
        .unwrap();

        Self {
            server,
            client: Arc::new(client),
            storage,
            redirects,
        }
    }

    fn drain_redirects(&mut self) -> Vec<String> {
        let mut seen = Vec::new();
        while let Ok(path) = self.redirects.try_recv() {
            seen.push(path);
        }
        seen
    }
}

fn user_json() -> serde_json::Value {
    json!({
        "id": 1,
        "email": "student@example.com",
        "full_name": "Sam Student",
        "role": "student"
    })
}

#[tokio::test]
async fn test_login_bearer_logout_flow() {
    let backend = Backend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({ "email": "student@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-123",
            "token_type": "bearer",
            "user": user_json(),
        })))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/subjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&backend.server)
        .await;

    let auth = AuthService::new(backend.client.clone());
    let user = auth
        .login(&LoginRequest::new("student@example.com", "secret"))
        .await
        .unwrap();
    assert_eq!(user.email, "student@example.com");
    assert_eq!(user.full_name.as_deref(), Some("Sam Student"));

    let _: Vec<Subject> = backend.client.get("/subjects").await.unwrap();
    auth.logout().await.unwrap();
    let _: Vec<Subject> = backend.client.get("/subjects").await.unwrap();

    let received = backend.server.received_requests().await.unwrap();
    let subject_calls: Vec<_> = received
        .iter()
        .filter(|r| r.url.path() == "/api/v1/subjects")
        .collect();
    assert_eq!(subject_calls.len(), 2);
    assert_eq!(
        subject_calls[0].headers.get("authorization").unwrap(),
        "Bearer tok-123"
    );
    assert!(subject_calls[1].headers.get("authorization").is_none());
    assert_eq!(
        subject_calls[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let backend = Backend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/subjects/1"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "detail": "busy" })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/subjects/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "name": "Physics" })),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let subjects = SubjectService::new(backend.client.clone());
    let subject = subjects.get(1).await.unwrap();

    assert_eq!(subject.name, "Physics");
}

#[tokio::test]
async fn test_server_errors_surface_after_last_attempt() {
    let backend = Backend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(3)
        .mount(&backend.server)
        .await;

    let error = backend
        .client
        .get::<serde_json::Value>("/courses")
        .await
        .unwrap_err();

    assert_eq!(error.status(), 500);
    assert_eq!(error.message(), "Request failed with status code 500");
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let backend = Backend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/subjects/42"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Subject not found" })),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let error = SubjectService::new(backend.client.clone())
        .get(42)
        .await
        .unwrap_err();

    assert_eq!(error.status(), 404);
    assert_eq!(error.message(), "Subject not found");
}

#[tokio::test]
async fn test_validation_errors_are_flattened() {
    let backend = Backend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {
                    "loc": ["body", "email"],
                    "msg": "value is not a valid email address",
                    "type": "value_error"
                },
                { "loc": ["body", "password"], "msg": "field required", "type": "missing" }
            ]
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let error = backend
        .client
        .post::<serde_json::Value, _>("/auth/register", &json!({ "email": "nope" }))
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Validation { status: 422, .. }));
    assert_eq!(
        error.message(),
        "value is not a valid email address, field required"
    );
    let details = error.details().unwrap();
    assert_eq!(details["validation_errors"].as_array().unwrap().len(), 2);
    let fields: Vec<_> = error
        .field_errors()
        .into_iter()
        .filter_map(|f| f.field)
        .collect();
    assert_eq!(fields, vec!["body.email", "body.password"]);
}

#[tokio::test]
async fn test_unauthorized_clears_tokens_and_redirects_once() {
    let mut backend = Backend::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Could not validate credentials" })),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Not authenticated" })),
        )
        .expect(2)
        .mount(&backend.server)
        .await;
    backend
        .client
        .store_credentials(&Credentials::bearer("stale"))
        .await
        .unwrap();

    let first = backend
        .client
        .get::<serde_json::Value>("/auth/me")
        .await
        .unwrap_err();
    let second = backend
        .client
        .get::<serde_json::Value>("/subjects")
        .await
        .unwrap_err();
    let third = backend
        .client
        .get::<serde_json::Value>("/courses")
        .await
        .unwrap_err();

    assert!(first.is_unauthorized());
    assert_eq!(first.message(), "Could not validate credentials");
    assert!(second.is_unauthorized() && third.is_unauthorized());
    assert_eq!(backend.storage.load_credentials().await.unwrap(), None);
    assert_eq!(backend.drain_redirects(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let storage = Arc::new(MemoryTokenStorage::new());
    let (navigator, _redirects) = ChannelNavigator::new();
    let client = ApiClient::new(
        Arc::new(ReqwestTransport::new().unwrap()),
        storage,
        Arc::new(navigator),
        ClientConfig::with_base_url("http://127.0.0.1:1/api/v1").with_retry(2, 5),
    )
    .unwrap();

    let error = client.get::<serde_json::Value>("/subjects").await.unwrap_err();

    assert!(matches!(error, ApiError::Network { .. }));
    assert_eq!(error.status(), 500);
    assert!(!error.message().is_empty());
}
