//! `VkClient::send` tests against a local one-shot HTTP server.

use tokio::net::TcpListener;

use vkbot::api::ApiError;

use crate::support::{client, fake_api};

#[tokio::test]
async fn send_posts_form_encoded_message() {
    let (url, server) = fake_api("200 OK", r#"{"response": 42}"#, 1).await;
    let client = client(url, &["tok-a"]);

    let result = client.send(7, ["a", "b"]).await.expect("send should succeed");
    assert_eq!(result.response, Some(42));

    let captured = server.await.expect("server should finish");
    let request = captured.first().expect("one request should arrive");
    assert!(request.request_line.starts_with("POST /method/messages.send "));

    let form = &request.form;
    assert_eq!(form.get("message").map(String::as_str), Some("a<br>b"));
    assert_eq!(form.get("user_id").map(String::as_str), Some("7"));
    assert_eq!(form.get("peer_id").map(String::as_str), Some("-123"));
    assert_eq!(form.get("access_token").map(String::as_str), Some("tok-a"));
    assert_eq!(form.get("v").map(String::as_str), Some("5.67"));

    let random_id: u32 = form
        .get("random_id")
        .and_then(|v| v.parse().ok())
        .expect("random_id should be numeric");
    assert!(random_id < 10_000);
}

#[tokio::test]
async fn http_error_status_is_surfaced_with_status_text() {
    let (url, _server) = fake_api("500 Internal Server Error", "oops", 1).await;
    let client = client(url, &["tok"]);

    let err = client.send(1, ["hi"]).await.expect_err("500 should fail");
    assert!(err.to_string().contains("Internal Server Error"), "got: {err}");
    match err {
        ApiError::HttpStatus { status, reason } => {
            assert_eq!(status, 500);
            assert_eq!(reason, "Internal Server Error");
        }
        other => panic!("expected HttpStatus, got: {other}"),
    }
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let (url, _server) = fake_api(
        "200 OK",
        r#"{"error":{"error_code":100,"error_msg":"bad request"}}"#,
        1,
    )
    .await;
    let client = client(url, &["tok"]);

    let err = client.send(1, ["hi"]).await.expect_err("API error should fail");
    assert!(err.to_string().contains("bad request"), "got: {err}");
    match err {
        ApiError::Api {
            code,
            message,
            request_params,
        } => {
            assert_eq!(code, 100);
            assert_eq!(message, "bad request");
            assert!(request_params.is_empty());
        }
        other => panic!("expected Api, got: {other}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_an_error() {
    let (url, _server) = fake_api("200 OK", "<html>not json</html>", 1).await;
    let client = client(url, &["tok"]);

    let err = client.send(1, ["hi"]).await.expect_err("bad body should fail");
    assert!(matches!(err, ApiError::Decode(_)), "got: {err}");
}

#[tokio::test]
async fn access_tokens_rotate_between_sends() {
    let (url, server) = fake_api("200 OK", r#"{"response": 1}"#, 3).await;
    let client = client(url, &["tok-a", "tok-b"]);

    for _ in 0..3 {
        client.send(1, ["hi"]).await.expect("send should succeed");
    }

    let captured = server.await.expect("server should finish");
    let tokens: Vec<&str> = captured
        .iter()
        .filter_map(|r| r.form.get("access_token").map(String::as_str))
        .collect();
    assert_eq!(tokens, vec!["tok-a", "tok-b", "tok-a"]);
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should expose addr");
    drop(listener);

    let client = client(format!("http://{addr}/method"), &["tok"]);
    let err = client.send(1, ["hi"]).await.expect_err("refused connection should fail");
    assert!(matches!(err, ApiError::Http(_)), "got: {err}");
}
