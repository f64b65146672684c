//! Concurrent calls for the same logical request share one network call

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use academix_core::domain::CourseQuery;

use crate::common;

fn secondary1_query() -> CourseQuery {
    CourseQuery {
        grade: Some("Secondary1".to_string()),
        page_number: 1,
        page_size: 10,
    }
}

#[tokio::test]
async fn test_back_to_back_identical_calls_hit_network_once() {
    let server = MockServer::start().await;
    let (client, _clock, _store) = common::setup_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/courses"))
        .and(query_param("grade", "Secondary1"))
        .and(query_param("pagenumber", "1"))
        .and(query_param("pagesize", "10"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::ok_envelope(common::course_list()))
                // Leave a window for the second caller to attach
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = secondary1_query();
    let (a, b) = tokio::join!(client.get_courses(&query), client.get_courses(&query));

    let a = a.expect("first caller failed");
    let b = b.expect("second caller failed");
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
    assert_eq!(a[0].id, "c1");
}

#[tokio::test]
async fn test_three_concurrent_callers_share_one_outcome() {
    let server = MockServer::start().await;
    let (client, _clock, _store) = common::setup_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::ok_envelope(common::course_list()))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (a, b, c) = tokio::join!(
        client.get_enrolled_courses(),
        client.get_enrolled_courses(),
        client.get_enrolled_courses(),
    );

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
}

#[tokio::test]
async fn test_concurrent_failures_fan_out_identically() {
    let server = MockServer::start().await;
    let (client, _clock, _store) = common::setup_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("backend exploded")
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (a, b) = tokio::join!(client.get_enrolled_courses(), client.get_enrolled_courses());

    let a = a.unwrap_err();
    let b = b.unwrap_err();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_failure_is_not_cached() {
    let server = MockServer::start().await;
    let (client, _clock, _store) = common::setup_client(&server).await;

    // Two sequential calls must both reach the network: a failed outcome
    // never populates the cache.
    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .expect(2)
        .mount(&server)
        .await;

    assert!(client.get_enrolled_courses().await.is_err());
    assert!(client.get_enrolled_courses().await.is_err());
}

#[tokio::test]
async fn test_abandoned_call_does_not_block_later_dispatches() {
    let server = MockServer::start().await;
    let (client, _clock, _store) = common::setup_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/courses/enrolled"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::ok_envelope(common::course_list()))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/courses/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::ok_envelope(
            serde_json::json!({ "id": "c1", "title": "Algebra I" }),
        )))
        .expect(1)
        .mount(&server)
        .await;

    // The caller gives up long before the backend answers
    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), client.get_enrolled_courses()).await;
    assert!(abandoned.is_err());

    // A different key must still be admitted afterwards
    let detail = tokio::time::timeout(Duration::from_secs(2), client.get_course("c1"))
        .await
        .expect("dispatch stayed blocked after an abandoned call")
        .unwrap();
    assert_eq!(detail.id, "c1");

    // The abandoned call ran to completion and populated the cache
    tokio::time::sleep(Duration::from_millis(400)).await;
    let courses = client.get_enrolled_courses().await.unwrap();
    assert_eq!(courses.len(), 2);
}

#[tokio::test]
async fn test_distinct_keys_each_dispatch() {
    let server = MockServer::start().await;
    let (client, _clock, _store) = common::setup_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::ok_envelope(
            common::course_list(),
        )))
        .expect(2)
        .mount(&server)
        .await;

    // Different page numbers resolve to different keys
    let page1 = CourseQuery {
        page_number: 1,
        ..secondary1_query()
    };
    let page2 = CourseQuery {
        page_number: 2,
        ..secondary1_query()
    };

    let (a, b) = tokio::join!(client.get_courses(&page1), client.get_courses(&page2));
    assert!(a.is_ok());
    assert!(b.is_ok());
}
