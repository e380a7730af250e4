mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{read_json, seeded_state};
use forumauth::app::build_router;
use http_helpers::{authed_request, json_request};
use tower::ServiceExt;

type App = axum::routing::RouterIntoService<Body, ()>;

async fn app() -> App {
    build_router(seeded_state(false).await).into_service()
}

#[tokio::test]
async fn health_reports_backend() {
    let app = app().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("health");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["backend"], "memory");
    assert_eq!(payload["durable"], false);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app().await;
    let request = Request::builder()
        .uri("/api/openapi.json")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("openapi");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["info"]["title"], "forumauth");
}

#[tokio::test]
async fn register_validates_input() {
    let app = app().await;

    let short_password = json_request(
        "POST",
        "/api/register",
        serde_json::json!({"username": "alice", "email": "alice@example.com", "password": "five5"}),
    );
    let response = app.clone().oneshot(short_password).await.expect("register");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json(response).await;
    assert_eq!(payload["code"], "validation_error");

    let bad_email = json_request(
        "POST",
        "/api/register",
        serde_json::json!({"username": "alice", "email": "nope", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(bad_email).await.expect("register");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let blank_username = json_request(
        "POST",
        "/api/register",
        serde_json::json!({"username": "  ", "email": "alice@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(blank_username).await.expect("register");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn register_login_and_reset_flow() {
    let app = app().await;

    let register = json_request(
        "POST",
        "/api/register",
        serde_json::json!({"username": "alice", "email": "alice@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(register).await.expect("register");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["username"], "alice");
    assert_eq!(payload["role"], "user");
    assert!(payload.get("password_hash").is_none());

    let login = json_request(
        "POST",
        "/api/login",
        serde_json::json!({"username": "alice", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(login).await.expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    let token = payload["token"].as_str().expect("token").to_string();
    assert_eq!(payload["user"]["username"], "alice");

    let by_email = json_request(
        "POST",
        "/api/login",
        serde_json::json!({"email": "alice@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(by_email).await.expect("login");
    assert_eq!(response.status(), StatusCode::OK);

    let reset = authed_request("POST", "/api/reset-token", &token);
    let response = app.clone().oneshot(reset).await.expect("reset");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert!(payload["token"].as_str().is_some());

    let wrong_password = json_request(
        "POST",
        "/api/login",
        serde_json::json!({"username": "alice", "password": "wrong-password"}),
    );
    let response = app.clone().oneshot(wrong_password).await.expect("login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let unknown = json_request(
        "POST",
        "/api/login",
        serde_json::json!({"username": "nobody", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(unknown).await.expect("login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_registration_conflicts() {
    let app = app().await;

    let register = json_request(
        "POST",
        "/api/register",
        serde_json::json!({"username": "alice", "email": "alice@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(register).await.expect("register");
    assert_eq!(response.status(), StatusCode::OK);

    let same_username = json_request(
        "POST",
        "/api/register",
        serde_json::json!({"username": "alice", "email": "other@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(same_username).await.expect("register");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json(response).await;
    assert_eq!(payload["code"], "already_exists");

    let same_email = json_request(
        "POST",
        "/api/register",
        serde_json::json!({"username": "bob", "email": "alice@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(same_email).await.expect("register");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn protected_routes_require_bearer() {
    let app = app().await;

    let bare = Request::builder()
        .uri("/api/users")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(bare).await.expect("users");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json(response).await;
    assert_eq!(payload["code"], "unauthorized");

    let wrong_scheme = Request::builder()
        .uri("/api/users")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(wrong_scheme).await.expect("users");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn setup_root_is_hidden_when_disabled() {
    let app = app().await;
    let request = json_request(
        "POST",
        "/internal/setup/root",
        serde_json::json!({"username": "root", "email": "root@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(request).await.expect("setup");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json(response).await;
    assert_eq!(payload["code"], "not_enabled");
}

#[tokio::test(flavor = "multi_thread")]
async fn setup_root_bootstraps_exactly_once() {
    let app: App = build_router(seeded_state(true).await).into_service();

    let request = json_request(
        "POST",
        "/internal/setup/root",
        serde_json::json!({"username": "root", "email": "root@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(request).await.expect("setup");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json(response).await;
    assert_eq!(payload["role"], "root");

    let again = json_request(
        "POST",
        "/internal/setup/root",
        serde_json::json!({"username": "root2", "email": "root2@example.com", "password": "hunter2!"}),
    );
    let response = app.clone().oneshot(again).await.expect("setup");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json(response).await;
    assert_eq!(payload["code"], "already_exists");
}
