//! Auth client tests against a mock HTTP backend.
//!
//! The three outcomes of an authentication attempt are covered: a
//! success payload, a rejection payload, and a transport failure.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use saidus::auth::{AuthClient, AuthError, CONNECTIVITY_ERROR, FALLBACK_ERROR};

#[tokio::test]
async fn login_success_yields_an_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "username": "ivan", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "ivan",
            "user_id": 42,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthClient::new(&server.uri());
    let identity = client.login("ivan", "secret").await.expect("login must succeed");

    assert_eq!(identity.display_name, "ivan");
    assert_eq!(identity.user_id, 42);
}

#[tokio::test]
async fn register_sends_the_email_and_yields_an_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .and(body_json(json!({
            "username": "ivan",
            "email": "ivan@example.com",
            "password": "secret",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "username": "ivan",
            "user_id": 7,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthClient::new(&server.uri());
    let identity = client
        .register("ivan", "ivan@example.com", "secret")
        .await
        .expect("registration must succeed");

    assert_eq!(identity.display_name, "ivan");
    assert_eq!(identity.user_id, 7);
}

#[tokio::test]
async fn rejection_surfaces_the_server_message_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "bad credentials",
        })))
        .mount(&server)
        .await;

    let client = AuthClient::new(&server.uri());
    let err = client.login("ivan", "wrong").await.expect_err("login must be rejected");

    match &err {
        AuthError::Rejected(message) => assert_eq!(message, "bad credentials"),
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert_eq!(err.to_string(), "bad credentials");
}

#[tokio::test]
async fn rejection_without_an_error_body_uses_the_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = AuthClient::new(&server.uri());
    let err = client.login("ivan", "secret").await.expect_err("login must fail");

    match err {
        AuthError::Rejected(message) => assert_eq!(message, FALLBACK_ERROR),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_connectivity_error_not_a_rejection() {
    // Nothing listens on the discard port, so the request never
    // completes; this is the third outcome, distinct from an error
    // payload.
    let client = AuthClient::new("http://127.0.0.1:9");
    let err = client.login("ivan", "secret").await.expect_err("request must fail");

    assert!(matches!(&err, AuthError::Connectivity(_)));
    assert_eq!(err.to_string(), CONNECTIVITY_ERROR);
}

#[tokio::test]
async fn each_submission_issues_exactly_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "недоступно",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthClient::new(&server.uri());
    let err = client.login("ivan", "secret").await.expect_err("login must fail");

    // No retry happens on failure; the mock's expectation of exactly
    // one request is verified when the server drops.
    assert!(matches!(err, AuthError::Rejected(_)));
}
