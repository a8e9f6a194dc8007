//! HTTP integration tests for the pitch REST API
//!
//! Full router dispatch through `oneshot`, with the generation webhook and the
//! identity service both served by wiremock and an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pitch_core::{MemoryPitchStore, PitchStore, SupabaseIdentity, WebhookGenerator};
use pitch_server::http::{build_router, HttpState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBHOOK_PATH: &str = "/webhook/pitch";

struct Harness {
    app: Router,
    store: Arc<MemoryPitchStore>,
    webhook: MockServer,
    _identity: MockServer,
}

/// Router wired to mock services. `alice-token` and `bob-token` are valid.
async fn harness(webhook_timeout: Duration) -> Harness {
    let identity_server = MockServer::start().await;
    for (token, user) in [("alice-token", "alice"), ("bob-token", "bob")] {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": user })))
            .mount(&identity_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "invalid JWT" })))
        .with_priority(10)
        .mount(&identity_server)
        .await;

    let webhook = MockServer::start().await;
    let store = Arc::new(MemoryPitchStore::new());

    let state = HttpState {
        store: store.clone(),
        generator: Arc::new(
            WebhookGenerator::new(
                format!("{}{}", webhook.uri(), WEBHOOK_PATH),
                webhook_timeout,
            )
            .unwrap(),
        ),
        identity: Arc::new(
            SupabaseIdentity::new(identity_server.uri(), "service-key".to_string()).unwrap(),
        ),
    };

    Harness {
        app: build_router(Arc::new(state)),
        store,
        webhook,
        _identity: identity_server,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {}", t));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {}", t));
    }
    builder.body(Body::empty()).unwrap()
}

fn complete_pitch() -> Value {
    json!({
        "title": "Lefty Box",
        "description": "Tools for lefties",
        "problem": "Hard to find",
        "solution": "Curated box",
        "targetMarket": "Left-handed people",
        "revenueModel": "Subscription",
        "callToAction": "Join the waitlist"
    })
}

// ===========================================================================
// TEST 1: GET /version and /health need no token
// ===========================================================================
#[tokio::test]
async fn test_public_endpoints() {
    let h = harness(Duration::from_secs(5)).await;

    let (status, body) = send(&h.app, get("/version", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["protocol"], "pitch/1");

    let (status, body) = send(&h.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

// ===========================================================================
// TEST 2: protected routes reject missing and invalid tokens with 401
// ===========================================================================
#[tokio::test]
async fn test_protected_routes_require_token() {
    let h = harness(Duration::from_secs(5)).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(complete_pitch()))
        .expect(0)
        .mount(&h.webhook)
        .await;

    let (status, body) = send(&h.app, get("/api/pitches", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    let (status, _) = send(
        &h.app,
        post("/api/pitch/generate", Some("forged"), json!({ "idea": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &h.app,
        post("/api/pitch/create", None, json!({ "idea": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.store.list("alice").await.unwrap().is_empty());
}

// ===========================================================================
// TEST 3: generate normalizes a wrapped webhook reply and stores nothing
// ===========================================================================
#[tokio::test]
async fn test_generate_normalizes_wrapped_output() {
    let h = harness(Duration::from_secs(5)).await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "output": complete_pitch() }])),
        )
        .expect(1)
        .mount(&h.webhook)
        .await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/pitch/generate",
            Some("alice-token"),
            json!({ "idea": "Scissors for left-handed people" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{:?}", body);
    assert_eq!(body["data"], complete_pitch());
    assert!(h.store.list("alice").await.unwrap().is_empty());
}

// ===========================================================================
// TEST 4: generate with a blank idea is 400 and never calls out
// ===========================================================================
#[tokio::test]
async fn test_generate_blank_idea_rejected() {
    let h = harness(Duration::from_secs(5)).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(complete_pitch()))
        .expect(0)
        .mount(&h.webhook)
        .await;

    let (status, _) = send(
        &h.app,
        post("/api/pitch/generate", Some("alice-token"), json!({ "idea": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// TEST 5: create with complete content makes no outbound call
// ===========================================================================
#[tokio::test]
async fn test_create_resubmission_skips_webhook() {
    let h = harness(Duration::from_secs(5)).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(complete_pitch()))
        .expect(0)
        .mount(&h.webhook)
        .await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/pitch/create",
            Some("alice-token"),
            json!({ "idea": "Left-handed scissors", "response": complete_pitch() }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{:?}", body);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["ownerId"], "alice");
    assert_eq!(body["data"]["content"], complete_pitch());
    assert_eq!(h.store.list("alice").await.unwrap().len(), 1);
}

// ===========================================================================
// TEST 6: create with incomplete content is 400 and stores nothing
// ===========================================================================
#[tokio::test]
async fn test_create_incomplete_content_rejected() {
    let h = harness(Duration::from_secs(5)).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(complete_pitch()))
        .expect(0)
        .mount(&h.webhook)
        .await;

    let (status, _) = send(
        &h.app,
        post(
            "/api/pitch/create",
            Some("alice-token"),
            json!({ "idea": "Left-handed scissors", "content": { "title": "Only a title" } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.store.list("alice").await.unwrap().is_empty());
}

// ===========================================================================
// TEST 7: create without content generates once then stores
// ===========================================================================
#[tokio::test]
async fn test_create_generates_when_content_missing() {
    let h = harness(Duration::from_secs(5)).await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(complete_pitch()))
        .expect(1)
        .mount(&h.webhook)
        .await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/pitch/create",
            Some("alice-token"),
            json!({ "idea": "Left-handed scissors" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{:?}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&h.app, get(&format!("/api/pitches/{}", id), Some("alice-token"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["idea"], "Left-handed scissors");
}

// ===========================================================================
// TEST 8: webhook timeout is 504 and no record is created
// ===========================================================================
#[tokio::test]
async fn test_create_timeout_stores_nothing() {
    let h = harness(Duration::from_millis(200)).await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(complete_pitch())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&h.webhook)
        .await;

    let (status, body) = send(
        &h.app,
        post(
            "/api/pitch/create",
            Some("alice-token"),
            json!({ "idea": "Left-handed scissors" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["status"], "error");
    assert!(h.store.list("alice").await.unwrap().is_empty());
}

// ===========================================================================
// TEST 9: webhook failure is 502
// ===========================================================================
#[tokio::test]
async fn test_generate_upstream_failure() {
    let h = harness(Duration::from_secs(5)).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("workflow crashed"))
        .mount(&h.webhook)
        .await;

    let (status, body) = send(
        &h.app,
        post("/api/pitch/generate", Some("alice-token"), json!({ "idea": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
}

// ===========================================================================
// TEST 10: list is newest first and owner scoped; foreign ids are 404
// ===========================================================================
#[tokio::test]
async fn test_list_newest_first_and_owner_scoped() {
    let h = harness(Duration::from_secs(5)).await;

    for idea in ["first", "second", "third"] {
        let (status, _) = send(
            &h.app,
            post(
                "/api/pitch/create",
                Some("alice-token"),
                json!({ "idea": idea, "content": complete_pitch() }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&h.app, get("/api/pitches", Some("alice-token"))).await;
    assert_eq!(status, StatusCode::OK);
    let ideas: Vec<&str> = body["pitches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["idea"].as_str().unwrap())
        .collect();
    assert_eq!(ideas, vec!["third", "second", "first"]);

    let alice_id = body["pitches"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&h.app, get("/api/pitches", Some("bob-token"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["pitches"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &h.app,
        get(&format!("/api/pitches/{}", alice_id), Some("bob-token")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
