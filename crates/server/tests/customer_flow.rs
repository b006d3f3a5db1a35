use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use server::startup;
use service::customer::password::PasswordAlgorithm;
use service::customer::repository::{mock::MockCustomerRepository, CustomerRepository};
use service::customer::service::AuthConfig;
use service::customer::token::TokenIssuer;

const SECRET: &str = "flow-test-secret";

fn auth() -> AuthConfig {
    AuthConfig {
        jwt_secret: SECRET.into(),
        token_ttl_secs: 3600,
        bcrypt_cost: 4,
        password_algorithm: PasswordAlgorithm::Bcrypt,
    }
}

fn build_app() -> (Arc<MockCustomerRepository>, Router) {
    let repo = Arc::new(MockCustomerRepository::default());
    let dyn_repo: Arc<dyn CustomerRepository> = repo.clone();
    let state = startup::state_with_repository(dyn_repo, auth(), false).expect("state");
    (repo, startup::app(state))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value, Option<String>) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&b).unwrap()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json, cookie)
}

async fn register(app: &Router, email: &str, password: &str) -> Value {
    let (status, body, _) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Ann", "email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body, _) = send(app, "POST", "/auth/login", None, Some(json!({"email": email, "password": password}))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let (_, app) = build_app();
    let (status, body, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_returns_created_without_password() {
    let (repo, app) = build_app();
    let body = register(&app, "ann@example.com", "secret1").await;
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["balance"], 0.0);
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let stored = repo.stored("ann@example.com").unwrap();
    assert_ne!(stored.password_hash, "secret1");
    assert!(stored.password_hash.starts_with("$2"));
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let (repo, app) = build_app();
    register(&app, "dup@example.com", "secret1").await;
    let (status, body, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Other", "email": "DUP@example.com ", "password": "secret2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn invalid_registration_lists_fields() {
    let (repo, app) = build_app();
    let (status, body, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "", "email": "not-an-email", "password": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    let fields: Vec<&str> = body["fields"].as_array().unwrap().iter().map(|f| f["field"].as_str().unwrap()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(repo.is_empty());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (_, app) = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_returns_token_and_cookie() {
    let (_, app) = build_app();
    let created = register(&app, "bob@example.com", "secret1").await;
    let (status, body, cookie) =
        send(&app, "POST", "/auth/login", None, Some(json!({"email": "bob@example.com", "password": "secret1"}))).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let claims = TokenIssuer::new(SECRET.as_bytes(), 3600).unwrap().verify(token).unwrap();
    assert_eq!(claims.id.to_string(), created["id"].as_str().unwrap());
    assert_eq!(claims.email, "bob@example.com");
    assert!(claims.exp > claims.iat);

    let cookie = cookie.expect("set-cookie");
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() {
    let (_, app) = build_app();
    register(&app, "carol@example.com", "secret1").await;

    let (s1, b1, _) =
        send(&app, "POST", "/auth/login", None, Some(json!({"email": "carol@example.com", "password": "wrong-pass"}))).await;
    let (s2, b2, _) =
        send(&app, "POST", "/auth/login", None, Some(json!({"email": "nobody@example.com", "password": "secret1"}))).await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(b1, b2);
}

#[tokio::test]
async fn customers_require_a_valid_token() {
    let (_, app) = build_app();
    let (status, body, _) = send(&app, "GET", "/customers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _, _) = send(&app, "GET", "/customers", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = TokenIssuer::new(b"some-other-secret", 3600).unwrap().issue(Uuid::new_v4(), "x@example.com").unwrap();
    let (status, _, _) = send(&app, "GET", "/customers", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cookie_token_is_accepted() {
    let (_, app) = build_app();
    register(&app, "dave@example.com", "secret1").await;
    let token = login(&app, "dave@example.com", "secret1").await;
    let req = Request::builder()
        .uri("/customers")
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn list_and_get_customers() {
    let (_, app) = build_app();
    let first = register(&app, "e1@example.com", "secret1").await;
    register(&app, "e2@example.com", "secret1").await;
    let token = login(&app, "e1@example.com", "secret1").await;

    let (status, body, _) = send(&app, "GET", "/customers", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.get("password").is_none()));

    let (status, body, _) = send(&app, "GET", "/customers?page=2&per_page=1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap()[0]["email"], "e2@example.com");

    let id = first["id"].as_str().unwrap();
    let (status, body, _) = send(&app, "GET", &format!("/customers/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "e1@example.com");

    let (status, _, _) = send(&app, "GET", &format!("/customers/{}", Uuid::new_v4()), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "GET", "/customers/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_create_hashes_password() {
    let (repo, app) = build_app();
    register(&app, "admin@example.com", "secret1").await;
    let token = login(&app, "admin@example.com", "secret1").await;

    let (status, body, _) = send(
        &app,
        "POST",
        "/customers",
        Some(&token),
        Some(json!({"name": "Fay", "email": "fay@example.com", "password": "secret9", "balance": 12.5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["balance"], 12.5);
    assert!(body.get("password").is_none());
    assert_ne!(repo.stored("fay@example.com").unwrap().password_hash, "secret9");
}

#[tokio::test]
async fn patch_changes_only_supplied_fields() {
    let (repo, app) = build_app();
    let created = register(&app, "gus@example.com", "secret1").await;
    let token = login(&app, "gus@example.com", "secret1").await;
    let id = created["id"].as_str().unwrap();
    let hash_before = repo.stored("gus@example.com").unwrap().password_hash;

    let (status, body, _) =
        send(&app, "PATCH", &format!("/customers/{id}"), Some(&token), Some(json!({"name": "Gustav"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Gustav");
    assert_eq!(body["email"], "gus@example.com");
    assert_eq!(body["balance"], 0.0);
    assert_eq!(repo.stored("gus@example.com").unwrap().password_hash, hash_before);

    let (status, _, _) =
        send(&app, "PATCH", &format!("/customers/{id}"), Some(&token), Some(json!({"password": "newsecret"}))).await;
    assert_eq!(status, StatusCode::OK);
    let hash_after = repo.stored("gus@example.com").unwrap().password_hash;
    assert_ne!(hash_after, hash_before);
    assert_ne!(hash_after, "newsecret");
    login(&app, "gus@example.com", "newsecret").await;
}

#[tokio::test]
async fn patch_rejects_taken_email_and_unknown_fields() {
    let (_, app) = build_app();
    let a = register(&app, "h1@example.com", "secret1").await;
    register(&app, "h2@example.com", "secret1").await;
    let token = login(&app, "h1@example.com", "secret1").await;
    let id = a["id"].as_str().unwrap();

    let (status, _, _) =
        send(&app, "PATCH", &format!("/customers/{id}"), Some(&token), Some(json!({"email": "h2@example.com"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) =
        send(&app, "PATCH", &format!("/customers/{id}"), Some(&token), Some(json!({"id": Uuid::new_v4()}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) =
        send(&app, "PATCH", &format!("/customers/{}", Uuid::new_v4()), Some(&token), Some(json!({"name": "Z"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_lookup_is_not_found() {
    let (repo, app) = build_app();
    let created = register(&app, "ivy@example.com", "secret1").await;
    let token = login(&app, "ivy@example.com", "secret1").await;
    let id = created["id"].as_str().unwrap();

    let (status, body, _) = send(&app, "DELETE", &format!("/customers/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Customer deleted successfully.");
    assert!(repo.is_empty());

    let (status, _, _) = send(&app, "GET", &format!("/customers/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, _) = send(&app, "DELETE", &format!("/customers/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (_, app) = build_app();
    let (status, body, _) = send(&app, "GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/customers/{id}").is_some());
}
