//! Shared test helpers for orchestration integration tests
//!
//! Provides wiremock-based mock backend setup. Each helper returns a
//! configured `ApiClient` pointing at the mock server, with a manual clock
//! so cache TTL behavior is deterministic.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::MockServer;

use academix_client::client::ApiClient;
use academix_client::store::MemorySessionStore;
use academix_core::config::ClientConfig;
use academix_core::domain::{StoredSession, UserProfile};
use academix_core::ports::ManualClock;

/// Bearer token the pre-installed test session starts with
pub const EXPIRED_TOKEN: &str = "expired-token";
/// Token the mock refresh endpoint hands out
pub const FRESH_TOKEN: &str = "fresh-token";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Client configuration pointed at the mock server, with a short throttle
/// cool-down so tests with several distinct keys stay fast.
pub fn test_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.backend.base_url = base_url.to_string();
    config.backend.tenant_id = "tenant-test".to_string();
    config.throttle.cooldown_ms = 10;
    config.throttle.jitter_min_ms = 1;
    config.throttle.jitter_max_ms = 5;
    config
}

/// A session with fixed identity so mocks can match its headers
pub fn test_session() -> StoredSession {
    StoredSession {
        access_token: EXPIRED_TOKEN.to_string(),
        device_id: "device-test-001".to_string(),
        tenant_id: "tenant-test".to_string(),
        profile: UserProfile {
            id: "user-test-001".to_string(),
            name: "Test Student".to_string(),
            email: "student@example.com".to_string(),
        },
        authenticated: true,
    }
}

/// Returns a client with a pre-installed session, its manual clock, and the
/// in-memory store backing the session.
pub async fn setup_client(
    server: &MockServer,
) -> (ApiClient, Arc<ManualClock>, Arc<MemorySessionStore>) {
    init_tracing();
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(MemorySessionStore::with_session(test_session()));
    let client = ApiClient::with_clock(&test_config(&server.uri()), store.clone(), clock.clone());
    client
        .restore_session()
        .await
        .expect("restoring the seeded session failed");
    (client, clock, store)
}

/// Returns a client with no session at all (pre-login flows)
pub async fn setup_anonymous_client(server: &MockServer) -> (ApiClient, Arc<MemorySessionStore>) {
    init_tracing();
    let store = Arc::new(MemorySessionStore::new());
    let client = ApiClient::new(&test_config(&server.uri()), store.clone());
    (client, store)
}

/// Wraps a payload in the backend's success envelope
pub fn ok_envelope(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

/// A small course list payload
pub fn course_list() -> Value {
    json!([
        { "id": "c1", "title": "Algebra I", "grade": "Secondary1" },
        { "id": "c2", "title": "Geometry", "grade": "Secondary1" }
    ])
}
