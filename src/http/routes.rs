//! Route handlers and router assembly.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use super::{AppState, ApiResponse};
use crate::auth::{CurrentActor, LoginRequest, RegisterRequest, RequireAdmin};
use crate::dashboard::DEFAULT_TOP_PLANS;
use crate::error::{PlanholdError, Result};
use crate::store::{NewPlan, PlanRecord, PlanSubscriptionCount, SubscriptionRecord, UserRecord};

/// Assemble the application router.
pub fn build_router(state: AppState) -> Router {
    let sessions = state.sessions.clone();

    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/plans", get(list_plans).post(create_plan))
        .route("/api/subscriptions", get(list_subscriptions).post(subscribe))
        .route("/api/subscriptions/{id}", get(view_subscription))
        .route("/api/subscriptions/{id}/upgrade", post(upgrade))
        .route("/api/subscriptions/{id}/downgrade", post(downgrade))
        .route("/api/subscriptions/{id}/cancel", post(cancel))
        .route("/api/subscriptions/{id}/renew", post(renew))
        .route("/api/dashboard/top-plans", get(top_plans))
        .layer(Extension(sessions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserRecord>>)> {
    let user = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    let (user, session_id) = state.auth.login(req).await?;
    let cookie = state.sessions.cookie(&session_id);

    let mut response = Json(ApiResponse::success(user)).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| PlanholdError::internal("Invalid session cookie value"))?,
    );
    Ok(response)
}

async fn logout(State(state): State<AppState>, current: CurrentActor) -> Result<Response> {
    state.auth.logout(&current.session_id).await?;
    let cookie = state.sessions.removal_cookie();

    let mut response = Json(ApiResponse::message("Logged out")).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| PlanholdError::internal("Invalid session cookie value"))?,
    );
    Ok(response)
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

async fn list_plans(
    State(state): State<AppState>,
    _current: CurrentActor,
) -> Result<ApiResponse<Vec<PlanRecord>>> {
    let plans = state.plans.list().await?;
    Ok(ApiResponse::success(plans))
}

async fn create_plan(
    State(state): State<AppState>,
    RequireAdmin(actor): RequireAdmin,
    Json(req): Json<NewPlan>,
) -> Result<(StatusCode, Json<ApiResponse<PlanRecord>>)> {
    let plan = state.plans.create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(plan))))
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SubscribeRequest {
    plan_id: i64,
}

#[derive(Deserialize)]
struct ChangePlanRequest {
    new_plan_id: i64,
}

async fn list_subscriptions(
    State(state): State<AppState>,
    current: CurrentActor,
) -> Result<ApiResponse<Vec<SubscriptionRecord>>> {
    let subs = state.lifecycle.list(&current.actor).await?;
    Ok(ApiResponse::success(subs))
}

async fn subscribe(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(req): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubscriptionRecord>>)> {
    let sub = state.lifecycle.subscribe(&current.actor, req.plan_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(sub))))
}

async fn view_subscription(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<i64>,
) -> Result<ApiResponse<SubscriptionRecord>> {
    let sub = state.lifecycle.view(&current.actor, id).await?;
    Ok(ApiResponse::success(sub))
}

async fn upgrade(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<ChangePlanRequest>,
) -> Result<ApiResponse<SubscriptionRecord>> {
    let sub = state
        .lifecycle
        .upgrade(&current.actor, id, req.new_plan_id)
        .await?;
    Ok(ApiResponse::success(sub))
}

async fn downgrade(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<ChangePlanRequest>,
) -> Result<ApiResponse<SubscriptionRecord>> {
    let sub = state
        .lifecycle
        .downgrade(&current.actor, id, req.new_plan_id)
        .await?;
    Ok(ApiResponse::success(sub))
}

async fn cancel(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<i64>,
) -> Result<ApiResponse<SubscriptionRecord>> {
    let sub = state.lifecycle.cancel(&current.actor, id).await?;
    Ok(ApiResponse::success(sub))
}

async fn renew(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<i64>,
) -> Result<ApiResponse<SubscriptionRecord>> {
    let sub = state.lifecycle.renew(&current.actor, id).await?;
    Ok(ApiResponse::success(sub))
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

async fn top_plans(
    State(state): State<AppState>,
    RequireAdmin(_actor): RequireAdmin,
) -> Result<ApiResponse<Vec<PlanSubscriptionCount>>> {
    let ranked = state.dashboard.top_plans(DEFAULT_TOP_PLANS).await?;
    Ok(ApiResponse::success(ranked))
}
