//! Token refresh coordination against a live mock backend

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use academix_client::refresh::RefreshCoordinator;
use academix_client::store::MemorySessionStore;
use academix_core::domain::ApiError;
use academix_core::ports::SessionStore;

use crate::common;

fn refresh_body(token: &str) -> serde_json::Value {
    common::ok_envelope(json!({ "token": token }))
}

/// Mounts a refresh endpoint that only accepts the expired credential
async fn mount_refresh(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(header(
            "authorization",
            format!("Bearer {}", common::EXPIRED_TOKEN).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body(common::FRESH_TOKEN)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_expired_credential_is_refreshed_and_call_replayed() {
    let server = MockServer::start().await;
    let (client, _clock, store) = common::setup_client(&server).await;

    mount_refresh(&server, 1).await;

    // The expired credential is rejected once...
    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .and(header(
            "authorization",
            format!("Bearer {}", common::EXPIRED_TOKEN).as_str(),
        ))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // ...and the replay with the fresh credential succeeds
    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .and(header(
            "authorization",
            format!("Bearer {}", common::FRESH_TOKEN).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::ok_envelope(
            common::course_list(),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let courses = client.get_enrolled_courses().await.unwrap();
    assert_eq!(courses.len(), 2);

    // The rotated token is authoritative, in memory and in the store
    assert_eq!(client.session().unwrap().access_token, common::FRESH_TOKEN);
    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token, common::FRESH_TOKEN);
    assert_eq!(stored.device_id, "device-test-001");
}

#[tokio::test]
async fn test_concurrent_unauthorized_calls_share_one_refresh() {
    let server = MockServer::start().await;
    common::init_tracing();

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(refresh_body(common::FRESH_TOKEN))
                // Widen the cycle so every joiner arrives while it runs
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let coordinator = Arc::new(RefreshCoordinator::new(
        reqwest::Client::new(),
        server.uri(),
        store,
    ));
    coordinator.install_session(common::test_session()).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let coordinator = Arc::clone(&coordinator);
        handles.push(tokio::spawn(
            async move { coordinator.handle_unauthorized().await },
        ));
    }

    for handle in handles {
        let token = handle.await.unwrap().unwrap();
        assert_eq!(token, common::FRESH_TOKEN);
    }

    assert_eq!(coordinator.waiter_count(), 0);
    assert_eq!(coordinator.current_token().unwrap(), common::FRESH_TOKEN);
}

#[tokio::test]
async fn test_refresh_rejection_ends_the_session() {
    let server = MockServer::start().await;
    let (client, _clock, store) = common::setup_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_enrolled_courses().await.unwrap_err();
    assert_eq!(err, ApiError::SessionExpired);

    // Hard failure: the session is gone everywhere
    assert!(!client.is_authenticated());
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_refresh_response_keeps_session() {
    let server = MockServer::start().await;
    let (client, _clock, store) = common::setup_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // A 200 that is not the refresh envelope is no verdict on the credential
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_enrolled_courses().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));

    // The session stays in place so a later 401 can retry the refresh
    assert!(client.is_authenticated());
    assert!(store.load().await.unwrap().is_some());
}

#[tokio::test]
async fn test_replayed_call_is_never_retried_again() {
    let server = MockServer::start().await;
    let (client, _clock, _store) = common::setup_client(&server).await;

    mount_refresh(&server, 1).await;

    // The endpoint rejects the fresh credential too. The client must give
    // up after one replay instead of looping through refresh cycles.
    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = client.get_enrolled_courses().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[tokio::test]
async fn test_sequential_cycles_refresh_independently() {
    let server = MockServer::start().await;
    common::init_tracing();

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body(common::FRESH_TOKEN)))
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let coordinator = Arc::new(RefreshCoordinator::new(
        reqwest::Client::new(),
        server.uri(),
        store,
    ));
    coordinator.install_session(common::test_session()).await;

    // Once the first cycle settles, a later 401 starts a new cycle
    coordinator.handle_unauthorized().await.unwrap();
    coordinator.handle_unauthorized().await.unwrap();
}

#[tokio::test]
async fn test_anonymous_call_never_enters_refresh() {
    let server = MockServer::start().await;
    let (client, _store) = common::setup_anonymous_client(&server).await;

    // No refresh mock mounted: any refresh attempt would 404 and change the
    // error below. A 401 without a session surfaces directly.
    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_enrolled_courses().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}
