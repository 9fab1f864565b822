//! HTTP middleware for zodiac-admin
//!
//! This module provides middleware layers for:
//! - Bearer token authorization of protected routes
//! - Request/response logging
//! - Request tracing spans

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::AuthManager;
use crate::database::Database;
use crate::error::AuthError;
use crate::models::Principal;

/// Verified identity, inserted into request extensions by [`auth_middleware`]
#[derive(Clone, Debug)]
pub struct AuthenticatedPrincipal(pub Principal);

/// Authorization middleware function
///
/// This middleware:
/// 1. Extracts the Authorization header
/// 2. Verifies the bearer token
/// 3. Adds the principal to the request extensions
///
/// Apply it with `route_layer` so unmatched paths still 404.
pub async fn auth_middleware<D: Database + 'static>(
    State(auth_manager): State<Arc<AuthManager<D>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthResponse> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = auth_manager.authorize(auth_header).map_err(|e| {
        tracing::debug!(reason = %e, path = %request.uri().path(), "Request not authorized");
        AuthResponse::from_error(e)
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedPrincipal(principal));

    Ok(next.run(request).await)
}

/// Authentication error response
///
/// The only place where [`AuthError`] variants are collapsed into the fixed
/// messages a client may see.
#[derive(Debug)]
pub struct AuthResponse {
    status: StatusCode,
    message: &'static str,
}

impl AuthResponse {
    /// Map an authentication error onto its public response
    pub fn from_error(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials | AuthError::AccountDisabled => Self {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid credentials",
            },
            AuthError::MalformedToken | AuthError::SignatureMismatch | AuthError::ExpiredToken => {
                Self {
                    status: StatusCode::UNAUTHORIZED,
                    message: "Invalid token",
                }
            }
            AuthError::MissingAuth => Self {
                status: StatusCode::UNAUTHORIZED,
                message: "Unauthorized",
            },
            AuthError::RateLimited => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Too many failed attempts. Please try again later.",
            },
            AuthError::Configuration(detail) | AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "Authentication unavailable");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal server error",
                }
            }
        }
    }

    /// HTTP status of the response
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Public error message
    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl IntoResponse for AuthResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Logging middleware function
///
/// Logs method, path, status and response time.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %uri.path(),
        status = %status.as_u16(),
        duration_ms = %elapsed.as_millis(),
        "Request completed"
    );

    response
}

/// Tracing middleware function
///
/// Wraps the whole request, including async work, in an `http_request` span.
/// The query string is left out of the span so tokens never reach the log.
pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    use tracing::Instrument;

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        http.method = %method,
        http.path = %path,
        http.status_code = tracing::field::Empty,
    );

    async move {
        let response = next.run(request).await;
        tracing::Span::current().record("http.status_code", response.status().as_u16());
        response
    }
    .instrument(span)
    .await
}
