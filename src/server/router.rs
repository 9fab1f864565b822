//! HTTP router for zodiac-admin
//!
//! This module defines the axum router that handles all HTTP requests.
//! It provides routes for:
//! - Health checks
//! - Login and session lookup
//! - Admin credential provisioning

use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use super::middleware::{
    auth_middleware, logging_middleware, tracing_middleware, AuthResponse, AuthenticatedPrincipal,
};
use crate::auth::AuthManager;
use crate::database::Database;
use crate::error::{AppError, DbError};
use crate::models::{AccountStatus, Principal};

/// Shared application state
pub struct AppState<D: Database> {
    /// Authentication manager
    pub auth_manager: Arc<AuthManager<D>>,
}

impl<D: Database> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            auth_manager: Arc::clone(&self.auth_manager),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Login request body
///
/// Missing fields deserialize as empty strings and fail as bad credentials.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Create admin request body
#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Change password request body
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password: String,
}

/// Change status request body
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: AccountStatus,
}

/// Build the main application router
///
/// `/health` and `/login` are open; every other route requires a bearer
/// token.
pub fn build_router<D: Database + 'static>(state: AppState<D>) -> Router {
    let protected = Router::new()
        .route("/session", get(session_handler))
        .route(
            "/api/admins",
            get(list_admins_handler::<D>).post(create_admin_handler::<D>),
        )
        .route("/api/admins/:id", get(get_admin_handler::<D>))
        .route(
            "/api/admins/:id/password",
            put(change_password_handler::<D>),
        )
        .route("/api/admins/:id/status", put(set_status_handler::<D>))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.auth_manager),
            auth_middleware::<D>,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler::<D>))
        .merge(protected)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(tracing_middleware))
        .with_state(state)
}

// =============================================================================
// Health, Login and Session Handlers
// =============================================================================

/// Health check endpoint handler
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Login handler
async fn login_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let ip = connect_info.map(|ConnectInfo(addr)| addr.ip());

    match state.auth_manager.login(&req.email, &req.password, ip).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "token": outcome.token,
                "user": user_json(&outcome.principal),
            })),
        )
            .into_response(),
        Err(e) => AuthResponse::from_error(e).into_response(),
    }
}

/// Current session handler
async fn session_handler(
    Extension(AuthenticatedPrincipal(principal)): Extension<AuthenticatedPrincipal>,
) -> impl IntoResponse {
    Json(serde_json::json!({ "user": user_json(&principal) }))
}

fn user_json(principal: &Principal) -> serde_json::Value {
    serde_json::json!({
        "email": principal.email,
        "role": principal.role,
    })
}

// =============================================================================
// Admin Provisioning Handlers
// =============================================================================

/// List admins handler
async fn list_admins_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
) -> impl IntoResponse {
    match state.auth_manager.list_admins().await {
        Ok(admins) => (
            StatusCode::OK,
            Json(serde_json::json!({ "admins": admins })),
        ),
        Err(e) => admin_error(e, "list admins"),
    }
}

/// Get admin by ID handler
async fn get_admin_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.auth_manager.get_admin(id).await {
        Ok(admin) => (StatusCode::OK, Json(serde_json::json!({ "admin": admin }))),
        Err(e) => admin_error(e, "get admin"),
    }
}

/// Create admin handler
async fn create_admin_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Extension(AuthenticatedPrincipal(principal)): Extension<AuthenticatedPrincipal>,
    Json(req): Json<CreateAdminRequest>,
) -> impl IntoResponse {
    match state
        .auth_manager
        .create_admin(&req.email, &req.password)
        .await
    {
        Ok(id) => {
            tracing::info!(admin_id = id, created_by = %principal.email, "Admin provisioned");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "id": id,
                    "email": crate::auth::normalize_email(&req.email),
                })),
            )
        }
        Err(e) => admin_error(e, "create admin"),
    }
}

/// Change admin password handler
async fn change_password_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
    Json(req): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    match state.auth_manager.change_password(id, &req.password).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Password updated" })),
        ),
        Err(e) => admin_error(e, "change password"),
    }
}

/// Enable or disable admin handler
async fn set_status_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
    Json(req): Json<SetStatusRequest>,
) -> impl IntoResponse {
    match state.auth_manager.set_admin_status(id, req.status).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": id, "status": req.status })),
        ),
        Err(e) => admin_error(e, "change admin status"),
    }
}

fn admin_error(error: AppError, action: &str) -> (StatusCode, Json<serde_json::Value>) {
    match error {
        AppError::InvalidInput(message) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": message })),
        ),
        AppError::Database(DbError::ConstraintViolation(_)) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "Admin already exists" })),
        ),
        AppError::Database(DbError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Admin not found" })),
        ),
        e => {
            tracing::error!(error = %e, "Failed to {}", action);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("Failed to {}", action) })),
            )
        }
    }
}
