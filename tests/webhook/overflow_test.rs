//! Queue overflow policy tests.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use vkbot::config::OverflowPolicy;
use vkbot::webhook::{self, WebhookSettings};

const SECRET: &str = "s3cr3t";

fn listen_with(policy: OverflowPolicy) -> (Router, tokio::sync::mpsc::Receiver<vkbot::types::Packet>) {
    webhook::listen(WebhookSettings {
        path: "/callback".to_owned(),
        secret: SECRET.to_owned(),
        confirmation: "confirm".to_owned(),
        queue_capacity: 1,
        overflow_policy: policy,
        enqueue_timeout: Duration::from_secs(5),
    })
    .expect("webhook should register")
}

async fn post_message(router: Router, text: &str) -> StatusCode {
    let body = serde_json::json!({
        "type": "message_new",
        "object": {"user_id": 1, "body": text},
        "secret": SECRET,
    });
    let request = Request::builder()
        .method("POST")
        .uri("/callback")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    router
        .oneshot(request)
        .await
        .expect("router is infallible")
        .status()
}

#[tokio::test]
async fn reject_policy_refuses_when_full() {
    let (router, mut rx) = listen_with(OverflowPolicy::Reject);

    assert_eq!(post_message(router.clone(), "first").await, StatusCode::OK);
    assert_eq!(
        post_message(router.clone(), "second").await,
        StatusCode::SERVICE_UNAVAILABLE
    );

    let packet = rx.try_recv().expect("first event should be queued");
    assert_eq!(packet.payload.body, "first");
    assert!(rx.try_recv().is_err(), "second event should have been dropped");

    // Space is available again after draining.
    assert_eq!(post_message(router, "third").await, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn timeout_policy_gives_up_after_the_wait_limit() {
    let (router, mut rx) = listen_with(OverflowPolicy::Timeout);

    assert_eq!(post_message(router.clone(), "first").await, StatusCode::OK);

    let started = tokio::time::Instant::now();
    assert_eq!(
        post_message(router, "second").await,
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert!(started.elapsed() >= Duration::from_secs(5));

    assert_eq!(rx.try_recv().expect("first event").payload.body, "first");
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn timeout_policy_succeeds_when_space_frees_in_time() {
    let (router, mut rx) = listen_with(OverflowPolicy::Timeout);
    assert_eq!(post_message(router.clone(), "first").await, StatusCode::OK);

    let pending = tokio::spawn(post_message(router, "second"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(rx.recv().await.expect("first event").payload.body, "first");

    assert_eq!(pending.await.expect("request task"), StatusCode::OK);
    assert_eq!(rx.recv().await.expect("second event").payload.body, "second");
}

#[tokio::test]
async fn block_policy_waits_for_the_consumer() {
    let (router, mut rx) = listen_with(OverflowPolicy::Block);
    assert_eq!(post_message(router.clone(), "first").await, StatusCode::OK);

    let pending = tokio::spawn(post_message(router, "second"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!pending.is_finished(), "request should wait for queue space");

    assert_eq!(rx.recv().await.expect("first event").payload.body, "first");
    assert_eq!(pending.await.expect("request task"), StatusCode::OK);
    assert_eq!(rx.recv().await.expect("second event").payload.body, "second");
}
