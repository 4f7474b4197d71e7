use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::storage::{MemoryStorage, StorageKey, StoredSession};
use crate::test_support::memory_client;

fn seed(storage: &MemoryStorage, token: &str) {
    storage
        .write_session(&StoredSession {
            access_token: token.to_owned(),
            refresh_token: "R".to_owned(),
            user: r#"{"username":"ana"}"#.to_owned(),
        })
        .unwrap();
}

#[derive(Default)]
struct CountingListener {
    calls: AtomicUsize,
}

impl AuthListener for CountingListener {
    fn on_unauthenticated(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// URL JOINING
// =============================================================================

#[test]
fn url_joins_with_and_without_leading_slash() {
    let client = ApiClient::new("http://127.0.0.1:8000/api/", Arc::new(MemoryStorage::new()));
    assert_eq!(client.base_url(), "http://127.0.0.1:8000/api");
    assert_eq!(client.url("/farms/"), "http://127.0.0.1:8000/api/farms/");
    assert_eq!(client.url("farms/"), "http://127.0.0.1:8000/api/farms/");
}

#[test]
fn request_builder_accumulates_query() {
    let request = ApiRequest::get("/farms/").query(vec![("a".into(), "1".into())]).query(vec![("b".into(), "2".into())]);
    assert_eq!(request.method(), &Method::GET);
    assert_eq!(request.query_pairs().len(), 2);
    assert!(matches!(request.body(), RequestBody::Empty));
}

// =============================================================================
// TOKEN ATTACHMENT
// =============================================================================

#[tokio::test]
async fn attaches_stored_token_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/farms/"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, storage) = memory_client(&server.uri());
    seed(&storage, "tok-1");
    let response = client.send(ApiRequest::get("/farms/")).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.value().unwrap(), json!([]));
}

#[tokio::test]
async fn no_token_means_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/farms/")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

    let (client, _storage) = memory_client(&server.uri());
    client.send(ApiRequest::get("/farms/")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn token_is_read_fresh_per_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/farms/")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

    let (client, storage) = memory_client(&server.uri());
    seed(&storage, "first");
    client.send(ApiRequest::get("/farms/")).await.unwrap();
    storage.insert(StorageKey::AccessToken, "second");
    client.send(ApiRequest::get("/farms/")).await.unwrap();
    storage.clear().unwrap();
    client.send(ApiRequest::get("/farms/")).await.unwrap();

    let seen: Vec<Option<String>> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.headers.get("authorization").map(|v| v.to_str().unwrap().to_owned()))
        .collect();
    assert_eq!(seen, vec![Some("Bearer first".to_owned()), Some("Bearer second".to_owned()), None]);
}

// =============================================================================
// REQUEST SHAPE
// =============================================================================

#[tokio::test]
async fn sends_query_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/farms/3/sales/"))
        .and(query_param("season", "kharif"))
        .and(body_json(json!({ "crop": "tomato", "qty": 12 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9 })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _storage) = memory_client(&server.uri());
    let request = ApiRequest::post("/farms/3/sales/")
        .query(vec![("season".to_owned(), "kharif".to_owned())])
        .json(json!({ "crop": "tomato", "qty": 12 }));
    let response = client.send(request).await.unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.json::<Value>().unwrap()["id"], 9);
}

#[tokio::test]
async fn empty_body_decodes_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE")).and(path("/farms/4/")).respond_with(ResponseTemplate::new(204)).mount(&server).await;

    let (client, _storage) = memory_client(&server.uri());
    let response = client.send(ApiRequest::delete("/farms/4/")).await.unwrap();
    assert_eq!(response.status, 204);
    assert_eq!(response.value().unwrap(), Value::Null);
}

// =============================================================================
// RESPONSE INTERCEPTION
// =============================================================================

#[tokio::test]
async fn other_errors_pass_through_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/farms/1/"))
        .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"detail":"nope"}"#))
        .mount(&server)
        .await;

    let (client, storage) = memory_client(&server.uri());
    seed(&storage, "tok");
    let err = client.send(ApiRequest::get("/farms/1/")).await.unwrap_err();
    assert!(matches!(&err, ApiError::Status { status: 403, body } if body == r#"{"detail":"nope"}"#));
    assert_eq!(err.status(), Some(403));
    assert_eq!(storage.access_token().as_deref(), Some("tok"));
}

#[tokio::test]
async fn unauthorized_notifies_listener() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/farms/")).respond_with(ResponseTemplate::new(401)).mount(&server).await;

    let (client, storage) = memory_client(&server.uri());
    seed(&storage, "stale");
    let listener = Arc::new(CountingListener::default());
    let weak: Weak<CountingListener> = Arc::downgrade(&listener);
    client.subscribe(weak);

    let err = client.send(ApiRequest::get("/farms/")).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated { .. }));
    assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unauthorized_without_listener_clears_storage() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/farms/")).respond_with(ResponseTemplate::new(401)).mount(&server).await;

    let (client, storage) = memory_client(&server.uri());
    seed(&storage, "stale");
    {
        let dropped = Arc::new(CountingListener::default());
        let weak: Weak<CountingListener> = Arc::downgrade(&dropped);
        client.subscribe(weak);
    }

    let err = client.send(ApiRequest::get("/farms/")).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(storage.is_empty());
}

#[tokio::test]
async fn network_failure_is_reported() {
    let (client, _storage) = memory_client("http://127.0.0.1:9");
    let err = client.send(ApiRequest::get("/farms/")).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}
