//! Integration test — build the router over in-memory stores and drive the
//! login, session and password-reset flows through HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use hr_api::{AppState, config::ApiConfig};
use hr_core::auth::config::AuthConfig;
use hr_core::auth::jwt::fixtures::issue_expired_token;
use hr_core::auth::password::hash_password;
use hr_core::clock::{Clock, ManualClock};
use hr_core::models::auth::{Principal, PrincipalKind};
use hr_core::notify::{LogNotifier, Notifier, NotifyError};
use hr_core::store::MemoryStore;
use serde_json::{Value, json};
use tower::ServiceExt;

struct RefusingNotifier;

#[async_trait]
impl Notifier for RefusingNotifier {
    async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected(503))
    }
}

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    employee: Principal,
}

fn harness_with(notifier: Arc<dyn Notifier>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let employee = store
        .insert_principal(
            PrincipalKind::Employee,
            "jdoe",
            "jdoe@example.com",
            &hash_password("old-password").expect("hash"),
        )
        .expect("insert employee");
    store
        .insert_principal(
            PrincipalKind::Admin,
            "root",
            "root@example.com",
            &hash_password("admin-password").expect("hash"),
        )
        .expect("insert admin");

    let clock = Arc::new(ManualClock::starting_now());
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        pg_connection_url: String::new(),
        auth: AuthConfig::with_secret("integration-secret").expect("config"),
        mail_relay_url: None,
        mail_sender: "no-reply@example.com".into(),
        secure_cookies: false,
    };
    let state = AppState::new(config, store.clone(), store.clone(), notifier, clock.clone());

    Harness {
        app: hr_api::router(state),
        store,
        clock,
        employee,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(LogNotifier))
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("parse JSON")
    };
    (status, json)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("build request")
}

async fn login(h: &Harness, kind: &str, username: &str, password: &str) -> (StatusCode, Value) {
    call(
        &h.app,
        post(
            &format!("/auth/{kind}/login"),
            json!({ "username": username, "password": password }),
        ),
    )
    .await
}

#[tokio::test]
async fn health_reports_ok_without_database() {
    let h = harness();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build request");
    let (status, json) = call(&h.app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["dbConnected"].is_null());
}

#[tokio::test]
async fn login_then_me_round_trip() {
    let h = harness();
    let (status, json) = login(&h, "admin", "root", "admin-password").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tokenType"], "Bearer");
    assert_eq!(json["expiresIn"], 86_400);
    assert_eq!(json["user"]["username"], "root");
    assert_eq!(json["user"]["kind"], "admin");

    let token = json["accessToken"].as_str().expect("token");
    let (status, me) = call(&h.app, get_with_token("/auth/me", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "root");
    assert_eq!(me["kind"], "admin");

    h.clock.advance(Duration::hours(24));
    let (status, err) = call(&h.app, get_with_token("/auth/me", token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "unauthorized");
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let h = harness();
    let resp = h
        .app
        .clone()
        .oneshot(post(
            "/auth/employee/login",
            json!({ "username": "jdoe", "password": "old-password" }),
        ))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header");
    assert!(cookie.starts_with("hr_session="));
    assert!(cookie.contains("HttpOnly"));

    let pair = cookie.split(';').next().expect("cookie pair");
    let req = Request::builder()
        .uri("/auth/me")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .expect("build request");
    let (status, me) = call(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "jdoe");
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let h = harness();
    let (s1, wrong_pw) = login(&h, "employee", "jdoe", "nope").await;
    let (s2, unknown) = login(&h, "employee", "ghost", "old-password").await;
    let (s3, wrong_kind) = login(&h, "admin", "jdoe", "old-password").await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(s3, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);
    assert_eq!(unknown, wrong_kind);
}

#[tokio::test]
async fn protected_routes_reject_bad_tokens() {
    let h = harness();

    let no_auth = Request::builder()
        .uri("/auth/me")
        .body(Body::empty())
        .expect("build request");
    let (status, _) = call(&h.app, no_auth).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&h.app, get_with_token("/auth/me", "not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired =
        issue_expired_token("root", PrincipalKind::Admin, h.clock.now()).expect("fixture");
    let (status, err) = call(&h.app, get_with_token("/auth/me", &expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "Invalid or expired token");
}

#[tokio::test]
async fn forgot_password_is_uniform_for_unknown_accounts() {
    let h = harness();
    let (s_known, known) = call(
        &h.app,
        post("/auth/employee/forgot-password", json!({ "username": "jdoe" })),
    )
    .await;
    let (s_unknown, unknown) = call(
        &h.app,
        post("/auth/employee/forgot-password", json!({ "username": "ghost" })),
    )
    .await;

    assert_eq!(s_known, StatusCode::OK);
    assert_eq!(s_unknown, StatusCode::OK);
    assert_eq!(known, unknown);
    assert!(known["expiresAt"].is_string());

    let history = h
        .store
        .otp_history(PrincipalKind::Employee, h.employee.id)
        .expect("history");
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn reset_password_flow() {
    let h = harness();
    let (status, _) = call(
        &h.app,
        post(
            "/auth/employee/forgot-password",
            json!({ "username": "jdoe@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let code = h
        .store
        .otp_history(PrincipalKind::Employee, h.employee.id)
        .expect("history")
        .pop()
        .expect("record")
        .code;
    let wrong = if code == "100000" { "100001" } else { "100000" };

    let (status, err) = call(
        &h.app,
        post(
            "/auth/employee/reset-password",
            json!({ "username": "jdoe", "otp": wrong, "newPassword": "brand-new-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_otp");

    let (status, _) = call(
        &h.app,
        post(
            "/auth/employee/reset-password",
            json!({ "username": "jdoe", "otp": code, "newPassword": "brand-new-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&h, "employee", "jdoe", "brand-new-pass").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = login(&h, "employee", "jdoe", "old-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Codes are single use.
    let (status, _) = call(
        &h.app,
        post(
            "/auth/employee/reset-password",
            json!({ "username": "jdoe", "otp": code, "newPassword": "another-pass-1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expired_code_is_rejected() {
    let h = harness();
    call(
        &h.app,
        post("/auth/employee/forgot-password", json!({ "username": "jdoe" })),
    )
    .await;
    let code = h
        .store
        .otp_history(PrincipalKind::Employee, h.employee.id)
        .expect("history")
        .pop()
        .expect("record")
        .code;

    h.clock.advance(Duration::minutes(15));
    let (status, _) = call(
        &h.app,
        post(
            "/auth/employee/reset-password",
            json!({ "username": "jdoe", "otp": code, "newPassword": "brand-new-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn undelivered_code_reports_bad_gateway() {
    let h = harness_with(Arc::new(RefusingNotifier));
    let (status, err) = call(
        &h.app,
        post("/auth/employee/forgot-password", json!({ "username": "jdoe" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(err["error"], "delivery_failed");

    // The record was persisted before delivery failed.
    let history = h
        .store
        .otp_history(PrincipalKind::Employee, h.employee.id)
        .expect("history");
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn change_password_requires_matching_session() {
    let h = harness();
    let (_, json) = login(&h, "employee", "jdoe", "old-password").await;
    let token = json["accessToken"].as_str().expect("token").to_string();

    let change = |uri: &str, body: Value| {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .expect("build request")
    };

    let body = json!({ "currentPassword": "old-password", "newPassword": "changed-pass-1" });
    let (status, _) = call(&h.app, change("/auth/admin/change-password", body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let weak = json!({ "currentPassword": "old-password", "newPassword": "short" });
    let (status, err) = call(&h.app, change("/auth/employee/change-password", weak)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation_error");

    let (status, _) = call(&h.app, change("/auth/employee/change-password", body)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&h, "employee", "jdoe", "changed-pass-1").await;
    assert_eq!(status, StatusCode::OK);
}
