//! Integration tests for the breach check node.
//!
//! These tests stand up a mock breach service so the full request and
//! response path runs without contacting Have I Been Pwned.

#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use pwnedgate::{
    ApiVersion, BreachCheckNode, Directory, Error, NodeConfig, Outcome, SharedState,
    StaticIdentity, TransportFailurePolicy,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADOBE: &str = r#"[{"Name":"Adobe"}]"#;

fn directory() -> Directory {
    Directory::new()
        .with_identity(
            "alice",
            "/",
            StaticIdentity::new().with_attribute("mail", "alice@example.com"),
        )
        .with_identity("nomail", "/", StaticIdentity::new())
}

fn node(server: &MockServer, config: NodeConfig) -> BreachCheckNode<Directory> {
    let config = config.with_base_url(server.uri());
    let http_client = pwnedgate::BreachClient::http_client(&config).unwrap();
    BreachCheckNode::new(config, directory(), http_client)
}

async fn respond(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_not_found_is_false_with_empty_payload() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(404),
    )
    .await;

    let node = node(&server, NodeConfig::default());
    let state = SharedState::for_user("alice", "/");

    let (outcome, new_state) = node.process(&state).await.unwrap();

    assert_eq!(outcome, Outcome::False);
    assert_eq!(
        new_state.to_value(),
        json!({"username": "alice", "realm": "/", "breaches": ""})
    );
}

#[tokio::test]
async fn test_found_is_true_with_raw_payload() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(200).set_body_string(ADOBE),
    )
    .await;

    let node = node(&server, NodeConfig::default());
    let (outcome, new_state) = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::True);
    assert_eq!(new_state.get_str("breaches"), Some(ADOBE));
}

#[tokio::test]
async fn test_payload_is_not_reformatted() {
    let body = "[\n  {\"Name\": \"Adobe\"},\n  {\"Name\": \"Dropbox\"}\n]\n";
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(200).set_body_string(body),
    )
    .await;

    let node = node(&server, NodeConfig::default());
    let (_, new_state) = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap();

    assert_eq!(new_state.get_str("breaches"), Some(body));
}

#[tokio::test]
async fn test_server_error_is_fatal() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(500).set_body_string("internal server error"),
    )
    .await;

    let node = node(&server, NodeConfig::default());
    let state = SharedState::for_user("alice", "/");

    let err = node.process(&state).await.unwrap_err();

    assert!(matches!(err, Error::UnexpectedStatus(500)));
    assert!(!state.contains_key("breaches"));
}

#[tokio::test]
async fn test_rate_limited_is_fatal() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(429).insert_header("retry-after", "2"),
    )
    .await;

    let node = node(&server, NodeConfig::default());
    let err = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnexpectedStatus(429)));
}

#[tokio::test]
async fn test_missing_mail_still_queries() {
    let server = MockServer::start().await;
    respond(&server, "/v3/breachedaccount/", ResponseTemplate::new(404)).await;

    let node = node(&server, NodeConfig::default());
    let (outcome, new_state) = node
        .process(&SharedState::for_user("nomail", "/"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::False);
    assert_eq!(new_state.get_str("breaches"), Some(""));
}

#[tokio::test]
async fn test_unknown_user_still_queries() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/",
        ResponseTemplate::new(200).set_body_string("[]"),
    )
    .await;

    let node = node(&server, NodeConfig::default());
    let (outcome, _) = node
        .process(&SharedState::for_user("mallory", "/"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::True);
}

#[tokio::test]
async fn test_v3_request_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/breachedaccount/alice@example.com"))
        .and(header("accept", "*/*"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", "Acme SSO"))
        .and(header("hibp-api-key", "secret-key"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = NodeConfig::default()
        .with_api_key("secret-key")
        .with_user_agent("Acme SSO");
    let node = node(&server, config);
    let (outcome, _) = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::False);
}

#[tokio::test]
async fn test_empty_api_key_is_sent() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(404),
    )
    .await;

    let node = node(&server, NodeConfig::default().with_api_key(""));
    let (outcome, _) = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::False);

    let requests = server.received_requests().await.unwrap();
    let api_key = requests[0].headers.get("hibp-api-key").unwrap();
    assert_eq!(api_key.to_str().unwrap(), "");
}

#[tokio::test]
async fn test_v2_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/breachedaccount/alice@example.com"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ADOBE))
        .expect(1)
        .mount(&server)
        .await;

    let node = node(
        &server,
        NodeConfig::default().with_api_version(ApiVersion::V2),
    );
    let (outcome, new_state) = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::True);
    assert_eq!(new_state.get_str("breaches"), Some(ADOBE));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("hibp-api-key"));
}

#[tokio::test]
async fn test_email_is_path_escaped() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/a%20b%2Fc@example.com",
        ResponseTemplate::new(404),
    )
    .await;

    let directory = Directory::new().with_identity(
        "odd",
        "/",
        StaticIdentity::new().with_attribute("mail", "a b/c@example.com"),
    );
    let config = NodeConfig::default().with_base_url(server.uri());
    let node = BreachCheckNode::new(config, directory, reqwest::Client::new());

    let (outcome, _) = node
        .process(&SharedState::for_user("odd", "/"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::False);
}

#[tokio::test]
async fn test_custom_breaches_key() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(200).set_body_string(ADOBE),
    )
    .await;

    let node = node(&server, NodeConfig::default().with_breaches_key("hibp"));
    let (_, new_state) = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap();

    assert_eq!(new_state.get_str("hibp"), Some(ADOBE));
    assert!(!new_state.contains_key("breaches"));
}

#[tokio::test]
async fn test_state_is_copied_not_mutated() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(200).set_body_string(ADOBE),
    )
    .await;

    let node = node(&server, NodeConfig::default());
    let state = SharedState::for_user("alice", "/")
        .with("breaches", "stale")
        .with("authLevel", 2)
        .with("transient", json!({"otp": "123456"}));
    let snapshot = state.clone();

    let (_, mut new_state) = node.process(&state).await.unwrap();

    assert_eq!(state, snapshot);
    assert_eq!(new_state.get_str("breaches"), Some(ADOBE));
    assert_eq!(new_state.get("authLevel"), Some(&json!(2)));
    assert_eq!(new_state.get("transient"), Some(&json!({"otp": "123456"})));
    assert_eq!(new_state.len(), state.len());

    let keys: Vec<&String> = new_state.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec!["username", "realm", "breaches", "authLevel", "transient"]
    );

    new_state.put("username", "mallory");
    assert_eq!(state.get_str("username"), Some("alice"));
}

#[tokio::test]
async fn test_slow_service_times_out_as_breached() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(404).set_delay(Duration::from_secs(5)),
    )
    .await;

    let node = node(&server, NodeConfig::default().with_timeout_secs(1));
    let started = Instant::now();
    let (outcome, new_state) = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(outcome, Outcome::True);
    assert!(!new_state.contains_key("breaches"));
}

#[tokio::test]
async fn test_slow_service_times_out_with_fail_policy() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/v3/breachedaccount/alice@example.com",
        ResponseTemplate::new(404).set_delay(Duration::from_secs(5)),
    )
    .await;

    let config = NodeConfig::default()
        .with_timeout_secs(1)
        .with_on_transport_error(TransportFailurePolicy::Fail);
    let node = node(&server, config);

    let err = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(e) if e.is_timeout()));
}

/// Answers one request with a 200 whose body is cut short of its length.
async fn truncated_body_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 64\r\n\
                  \r\n\
                  [{\"Name\":",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_body_read_failure_is_breached_without_payload() {
    let config = NodeConfig::default().with_base_url(truncated_body_server().await);
    let node = BreachCheckNode::new(config, directory(), reqwest::Client::new());

    let (outcome, new_state) = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::True);
    assert!(!new_state.contains_key("breaches"));
}

#[tokio::test]
async fn test_body_read_failure_with_fail_policy() {
    let config = NodeConfig::default()
        .with_base_url(truncated_body_server().await)
        .with_on_transport_error(TransportFailurePolicy::Fail);
    let node = BreachCheckNode::new(config, directory(), reqwest::Client::new());

    let err = node
        .process(&SharedState::for_user("alice", "/"))
        .await
        .unwrap_err();

    assert!(matches!(&err, Error::Http(e) if !e.is_builder()));
}
