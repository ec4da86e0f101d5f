//! End-to-end tests for the item API.
//!
//! These drive the full router (rate limit, auth, handlers, audit log) with
//! an in-memory repository standing in for PostgreSQL.

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use item_service::{
    error::AppError,
    handlers::AppState,
    middleware::{auth::JwtVerifier, rate_limit::RateLimiter},
    models::{
        audit::AuditAction,
        item::{Item, ItemFields},
    },
    services::{
        audit_service::{AuditLog, read_records},
        item_repository::ItemRepository,
    },
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

/// In-memory repository that counts every call.
#[derive(Default)]
struct MemoryRepo {
    items: Mutex<Vec<Item>>,
    next_id: AtomicUsize,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryRepo {
    fn enter(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for MemoryRepo {
    async fn create(&self, fields: &ItemFields) -> Result<i32, AppError> {
        self.enter()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i32 + 1;
        self.items.lock().unwrap().push(Item {
            id,
            name: fields.name().to_string(),
            description: fields.description().to_string(),
        });
        Ok(id)
    }

    async fn get_all(&self) -> Result<Vec<Item>, AppError> {
        self.enter()?;
        Ok(self.items.lock().unwrap().clone())
    }

    async fn get_by_id(&self, id: i32) -> Result<Item, AppError> {
        self.enter()?;
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(AppError::ItemNotFound)
    }

    async fn update(&self, id: i32, fields: &ItemFields) -> Result<(), AppError> {
        self.enter()?;
        if let Some(item) = self.items.lock().unwrap().iter_mut().find(|i| i.id == id) {
            item.name = fields.name().to_string();
            item.description = fields.description().to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.enter()?;
        self.items.lock().unwrap().retain(|item| item.id != id);
        Ok(())
    }
}

struct TestApp {
    router: Router,
    repo: Arc<MemoryRepo>,
    audit: AuditLog,
    audit_path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_quota(100)
    }

    fn with_quota(quota: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let audit_path = dir.path().join("logs.json");
        let audit = AuditLog::spawn(&audit_path);
        let repo = Arc::new(MemoryRepo::default());

        let state = AppState {
            items: repo.clone(),
            audit: audit.clone(),
        };
        let router = item_service::router(
            state,
            Arc::new(RateLimiter::new(quota, Duration::from_secs(900))),
            Arc::new(JwtVerifier::new(SECRET)),
        )
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        Self {
            router,
            repo,
            audit,
            audit_path,
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

fn token() -> String {
    encode(
        &Header::default(),
        &json!({"sub": "tester"}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token()));

    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn create_then_get_returns_same_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/items",
            Some(json!({"name": "Widget", "description": "A thing"})),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Item created");
    let id = body["id"].as_i64().expect("numeric id");

    let (status, body) = app
        .send(request(Method::GET, &format!("/api/items/{id}"), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": id, "name": "Widget", "description": "A thing"})
    );
}

#[tokio::test]
async fn list_returns_every_created_item() {
    let app = TestApp::new();

    let (status, body) = app.send(request(Method::GET, "/api/items", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    for n in 0..3 {
        app.send(request(
            Method::POST,
            "/api/items",
            Some(json!({"name": format!("item {n}"), "description": "d"})),
        ))
        .await;
    }

    let (_, body) = app.send(request(Method::GET, "/api/items", None)).await;
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["item 0", "item 1", "item 2"]);
}

#[tokio::test]
async fn create_with_missing_field_is_bad_request() {
    let app = TestApp::new();

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/items",
            Some(json!({"name": "Widget"})),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
    assert_eq!(app.repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/items")
        .header("Authorization", token())
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn get_unknown_item_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.send(request(Method::GET, "/api/items/42", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "item_not_found");
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let app = TestApp::new();

    let (status, _) = app
        .send(request(Method::GET, "/api/items/abc", None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_of_missing_item_changes_nothing() {
    let app = TestApp::new();
    app.send(request(
        Method::POST,
        "/api/items",
        Some(json!({"name": "Widget", "description": "A thing"})),
    ))
    .await;
    let (_, before) = app.send(request(Method::GET, "/api/items", None)).await;

    let (status, body) = app
        .send(request(
            Method::PUT,
            "/api/items/999",
            Some(json!({"name": "Other", "description": "Changed"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item updated");

    let (_, after) = app.send(request(Method::GET, "/api/items", None)).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn update_replaces_fields() {
    let app = TestApp::new();
    let (_, created) = app
        .send(request(
            Method::POST,
            "/api/items",
            Some(json!({"name": "Widget", "description": "A thing"})),
        ))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .send(request(
            Method::PUT,
            &format!("/api/items/{id}"),
            Some(json!({"name": "Gadget", "description": "Another thing"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, item) = app
        .send(request(Method::GET, &format!("/api/items/{id}"), None))
        .await;
    assert_eq!(item["id"], id);
    assert_eq!(item["name"], "Gadget");
    assert_eq!(item["description"], "Another thing");
}

#[tokio::test]
async fn update_with_blank_field_is_bad_request() {
    let app = TestApp::new();

    let (status, _) = app
        .send(request(
            Method::PUT,
            "/api/items/1",
            Some(json!({"name": "", "description": "x"})),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delete_is_idempotent_and_removes_item() {
    let app = TestApp::new();

    let (status, body) = app
        .send(request(Method::DELETE, "/api/items/77", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item deleted");

    let (_, created) = app
        .send(request(
            Method::POST,
            "/api/items",
            Some(json!({"name": "Widget", "description": "A thing"})),
        ))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .send(request(Method::DELETE, &format!("/api/items/{id}"), None))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(request(Method::GET, &format!("/api/items/{id}"), None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_failure_is_generic_500() {
    let app = TestApp::new();
    app.repo.fail.store(true, Ordering::SeqCst);

    let (status, body) = app.send(request(Method::GET, "/api/items", None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "An internal error occurred");
}

#[tokio::test]
async fn missing_token_is_rejected_before_handlers() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/api/items")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "missing_token");
    assert_eq!(app.repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_bearer_token_is_unauthorized() {
    let app = TestApp::new();

    for header in ["Bearer ", "Bearer"] {
        let request = Request::builder()
            .uri("/api/items")
            .header("Authorization", header)
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {header:?}");
        assert_eq!(body["error"]["code"], "missing_token");
    }
    assert_eq!(app.repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unverifiable_token_is_forbidden() {
    let app = TestApp::new();
    let forged = encode(
        &Header::default(),
        &json!({"sub": "mallory"}),
        &EncodingKey::from_secret(b"wrong-secret"),
    )
    .unwrap();

    let request = Request::builder()
        .uri("/api/items")
        .header("Authorization", forged)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "invalid_token");
    assert_eq!(app.repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn quota_exhaustion_returns_429() {
    let app = TestApp::with_quota(100);

    for i in 1..=100 {
        let (status, _) = app.send(request(Method::GET, "/api/items", None)).await;
        assert_eq!(status, StatusCode::OK, "request {i} should pass");
    }

    let (status, body) = app.send(request(Method::GET, "/api/items", None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "rate_limited");
    assert!(body["retry_after_seconds"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn rate_limit_applies_before_auth() {
    let app = TestApp::with_quota(1);

    let anonymous = || {
        Request::builder()
            .uri("/api/items")
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = app.send(anonymous()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(anonymous()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn mutations_are_audited() {
    let app = TestApp::new();

    let (_, created) = app
        .send(request(
            Method::POST,
            "/api/items",
            Some(json!({"name": "Widget", "description": "A thing"})),
        ))
        .await;
    let id = created["id"].as_i64().unwrap() as i32;
    app.send(request(
        Method::PUT,
        &format!("/api/items/{id}"),
        Some(json!({"name": "Gadget", "description": "Another thing"})),
    ))
    .await;
    app.send(request(Method::DELETE, &format!("/api/items/{id}"), None))
        .await;
    // Reads are not audited.
    app.send(request(Method::GET, "/api/items", None)).await;

    app.audit.flush().await;
    let records = read_records(&app.audit_path).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].action, AuditAction::Create);
    assert_eq!(records[0].name.as_deref(), Some("Widget"));
    assert_eq!(records[1].action, AuditAction::Update);
    assert_eq!(records[1].id, Some(id));
    assert_eq!(records[2].action, AuditAction::Delete);
    assert_eq!(records[2].name, None);
}

#[tokio::test]
async fn failed_mutation_is_not_audited() {
    let app = TestApp::new();
    app.repo.fail.store(true, Ordering::SeqCst);

    let (status, _) = app
        .send(request(Method::DELETE, "/api/items/1", None))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    app.audit.flush().await;
    assert!(read_records(&app.audit_path).await.unwrap().is_empty());
}
