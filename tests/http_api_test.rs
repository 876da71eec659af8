//! End-to-end tests for the HTTP API surface.
//!
//! Drives the router with in-memory backends and checks the status-code
//! mapping the boundary layer promises: 401 without a session, 403 on role
//! or ownership failures, 422 on price-ordering violations.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use planhold::auth::{
    AuthService, InMemorySessionStore, PasswordConfig, PasswordHasher, SessionConfig, Sessions,
};
use planhold::http::{AppState, build_router};
use planhold::notify::RecordingNotifier;
use planhold::store::{InMemoryStore, Store};

fn app() -> Router {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let sessions = Sessions::new(
        Arc::new(InMemorySessionStore::new()),
        SessionConfig {
            cookie_secure: false,
            ..Default::default()
        },
    );
    let notifier = Arc::new(RecordingNotifier::new());

    let auth = AuthService::new(store.clone(), sessions.clone(), notifier.clone())
        .with_hasher(PasswordHasher::new(PasswordConfig::fast()));

    let state = AppState::new(store, notifier, sessions).with_auth(auth);
    build_router(state)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Register and log in, returning the session cookie pair.
async fn login_as(app: &Router, name: &str, email: &str, role: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "name": name,
                "email": email,
                "password": "a-strong-password",
                "role": role,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            Some(json!({
                "email": email,
                "password": "a-strong-password",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets a session cookie")
        .to_str()
        .unwrap();
    // "name=value; Path=/; ..." -> "name=value"
    set_cookie.split(';').next().unwrap().to_string()
}

async fn create_plan(app: &Router, admin_cookie: &str, name: &str, price_cents: i64) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/plans",
            Some(admin_cookie),
            Some(json!({
                "name": name,
                "description": "test plan",
                "quota": 100,
                "price_cents": price_cents,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .oneshot(json_request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unauthenticated_requests_get_401() {
    let app = app();
    for uri in ["/api/plans", "/api/subscriptions", "/api/dashboard/top-plans"] {
        let response = app
            .clone()
            .oneshot(json_request("GET", uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

        let json = response_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Login required"));
    }
}

#[tokio::test]
async fn plan_creation_is_admin_only() {
    let app = app();
    let user_cookie = login_as(&app, "Ada", "ada@example.com", "user").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/plans",
            Some(&user_cookie),
            Some(json!({
                "name": "Basic",
                "description": null,
                "quota": 10,
                "price_cents": 1000,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_cookie = login_as(&app, "Root", "root@example.com", "admin").await;
    create_plan(&app, &admin_cookie, "Basic", 1000).await;

    // the new plan is visible to authenticated users
    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/plans", Some(&user_cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn subscription_lifecycle_over_http() {
    let app = app();
    let admin_cookie = login_as(&app, "Root", "root@example.com", "admin").await;
    let basic = create_plan(&app, &admin_cookie, "Basic", 1000).await;
    let pro = create_plan(&app, &admin_cookie, "Pro", 2000).await;

    let user_cookie = login_as(&app, "Ada", "ada@example.com", "user").await;

    // subscribe to Basic
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/subscriptions",
            Some(&user_cookie),
            Some(json!({ "plan_id": basic })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let sub_id = response_json(response).await["data"]["id"].as_i64().unwrap();

    // upgrade to Pro
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/subscriptions/{sub_id}/upgrade"),
            Some(&user_cookie),
            Some(json!({ "new_plan_id": pro })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // "upgrading" back down is a 422
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/subscriptions/{sub_id}/upgrade"),
            Some(&user_cookie),
            Some(json!({ "new_plan_id": basic })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // renew, then cancel
    for action in ["renew", "cancel"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/subscriptions/{sub_id}/{action}"),
                Some(&user_cookie),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{action}");
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/subscriptions/{sub_id}"),
            Some(&user_cookie),
            None,
        ))
        .await
        .unwrap();
    let json = response_json(response).await;
    assert_eq!(json["data"]["status"], "cancelled");
}

#[tokio::test]
async fn foreign_subscription_is_forbidden() {
    let app = app();
    let admin_cookie = login_as(&app, "Root", "root@example.com", "admin").await;
    let basic = create_plan(&app, &admin_cookie, "Basic", 1000).await;

    let owner_cookie = login_as(&app, "Owner", "owner@example.com", "user").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/subscriptions",
            Some(&owner_cookie),
            Some(json!({ "plan_id": basic })),
        ))
        .await
        .unwrap();
    let sub_id = response_json(response).await["data"]["id"].as_i64().unwrap();

    let attacker_cookie = login_as(&app, "Attacker", "attacker@example.com", "user").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/subscriptions/{sub_id}/cancel"),
            Some(&attacker_cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // admins may view but are not special for mutation
    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/subscriptions/{sub_id}"),
            Some(&admin_cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/subscriptions/{sub_id}/cancel"),
            Some(&admin_cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboard_ranks_plans_for_admins_only() {
    let app = app();
    let admin_cookie = login_as(&app, "Root", "root@example.com", "admin").await;
    let basic = create_plan(&app, &admin_cookie, "Basic", 1000).await;
    let pro = create_plan(&app, &admin_cookie, "Pro", 2000).await;

    let user_cookie = login_as(&app, "Ada", "ada@example.com", "user").await;
    for plan_id in [pro, pro, basic] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/subscriptions",
                Some(&user_cookie),
                Some(json!({ "plan_id": plan_id })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/dashboard/top-plans",
            Some(&user_cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/dashboard/top-plans",
            Some(&admin_cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    let ranked = json["data"].as_array().unwrap();
    assert_eq!(ranked[0]["plan_name"], "Pro");
    assert_eq!(ranked[0]["subscriptions"], 2);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = app();
    let cookie = login_as(&app, "Ada", "ada@example.com", "user").await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/logout", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/plans", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
