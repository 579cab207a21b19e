//! `HttpRemote` against a `wiremock` sync server.

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use keepsync::errors::KeepSyncError;
use keepsync::sync::{Credentials, HttpRemote, Remote, TokenHolder};
use keepsync::vault::{Digest, Secret, SecretKind};
use uuid::Uuid;

fn credentials() -> Credentials {
    Credentials {
        login: "alice".into(),
        password: "hunter22".into(),
    }
}

fn remote_for(server: &MockServer, tokens: TokenHolder) -> HttpRemote {
    HttpRemote::new(&server.uri(), tokens).unwrap()
}

fn authorization(request: &Request) -> Option<&str> {
    request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
}

// ---------------------------------------------------------------------------
// Session token handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_token_is_sent_on_later_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("Authorization", "Bearer first"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sync"))
        .and(header("Authorization", "Bearer first"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::new());
    remote.login(&credentials()).await.unwrap();
    assert_eq!(remote.tokens().get().as_deref(), Some("Bearer first"));

    let digests = remote.digests("alice").await.unwrap();
    assert!(digests.is_empty());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["login"], "alice");
    assert_eq!(body["password"], "hunter22");
    assert_eq!(authorization(&requests[0]), None);
}

#[tokio::test]
async fn rotated_token_replaces_the_old_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sync"))
        .respond_with(ResponseTemplate::new(204).insert_header("Authorization", "Bearer second"))
        .mount(&server)
        .await;

    let tokens = TokenHolder::with_token("Bearer first");
    let remote = remote_for(&server, tokens.clone());
    remote.digests("alice").await.unwrap();
    remote.digests("alice").await.unwrap();

    assert_eq!(tokens.get().as_deref(), Some("Bearer second"));
    let requests = server.received_requests().await.unwrap();
    assert_eq!(authorization(&requests[0]), Some("Bearer first"));
    assert_eq!(authorization(&requests[1]), Some("Bearer second"));
}

#[tokio::test]
async fn login_without_token_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::new());
    assert!(matches!(
        remote.login(&credentials()).await,
        Err(KeepSyncError::Transport(_))
    ));
}

#[tokio::test]
async fn rejected_login_surfaces_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::new());
    let err = remote.login(&credentials()).await.unwrap_err();
    assert!(err.to_string().contains("401"));
    assert!(remote.tokens().get().is_none());
}

#[tokio::test]
async fn register_posts_the_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/register"))
        .and(body_json(serde_json::json!({"login": "alice", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    remote_for(&server, TokenHolder::new())
        .register(&credentials())
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Remote operations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn digests_are_parsed_from_wire_names() {
    let id = Uuid::new_v4();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": id,
            "value_hash": "aa",
            "description_hash": "bb",
            "is_deleted": true,
            "ver": "2024-05-01T10:00:00.123456Z",
        }])))
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::new());
    let digests: Vec<Digest> = remote.digests("alice").await.unwrap();
    assert_eq!(digests.len(), 1);
    assert_eq!(digests[0].id, id);
    assert_eq!(digests[0].payload_hash, "aa");
    assert_eq!(digests[0].description_hash, "bb");
    assert!(digests[0].deleted);
}

#[tokio::test]
async fn malformed_digest_listing_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::new());
    assert!(matches!(
        remote.digests("alice").await,
        Err(KeepSyncError::Decode(_))
    ));
}

#[tokio::test]
async fn push_puts_the_secret_json() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::with_token("Bearer t"));
    let secret = Secret::new("alice", SecretKind::BankCard, "visa", b"ct".to_vec());
    remote.push(&secret).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(authorization(&requests[0]), Some("Bearer t"));
    let sent: Secret = requests[0].body_json().unwrap();
    assert_eq!(sent, secret);
    let raw: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(raw["secret_type"], "bank_cards");
}

#[tokio::test]
async fn rejected_push_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::new());
    let secret = Secret::new("alice", SecretKind::Text, "note", b"ct".to_vec());
    let err = remote.push(&secret).await.unwrap_err();
    assert!(matches!(err, KeepSyncError::Transport(_)));
    assert!(!err.is_skip());
}

#[tokio::test]
async fn pull_posts_the_id_and_maps_no_content_to_not_found() {
    let stored = Secret::new("alice", SecretKind::Text, "note", b"ct".to_vec());
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/"))
        .and(body_json(stored.id))
        .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::new());
    assert_eq!(remote.pull(stored.id).await.unwrap(), stored);

    let missing = Uuid::new_v4();
    assert!(matches!(
        remote.pull(missing).await,
        Err(KeepSyncError::NotFound(id)) if id == missing
    ));
}

#[tokio::test]
async fn ping_failures_are_liveness_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let remote = remote_for(&server, TokenHolder::new());
    let err = remote.ping().await.unwrap_err();
    assert!(matches!(err, KeepSyncError::Liveness(_)));

    // Nothing listens on a port we just released.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let remote = HttpRemote::new(&format!("http://{addr}"), TokenHolder::new()).unwrap();
    assert!(remote.ping().await.unwrap_err().is_skip());
}

#[tokio::test]
async fn healthy_ping_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    remote_for(&server, TokenHolder::new()).ping().await.unwrap();
}
