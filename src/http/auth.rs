//! Caller identity and the internal callback guard.
//!
//! Authentication itself happens upstream of this service. The gateway
//! forwards the authenticated user's identifier in `X-User-Id`; requests
//! without a well-formed identifier are rejected with 401.

use super::error::ApiError;
use super::state::AppState;
use crate::workspace::domain::UserId;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

/// Header carrying the authenticated user's identifier.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(|uuid| Self(UserId::from_uuid(uuid)))
            .ok_or_else(|| ApiError::unauthorized("user not authenticated"))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects internal callbacks that do not carry the shared secret.
///
/// When no secret is configured every callback is accepted.
pub async fn require_internal_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.internal_secret.as_deref() else {
        return next.run(request).await;
    };
    if bearer_token(request.headers()) == Some(expected) {
        return next.run(request).await;
    }
    tracing::warn!(path = %request.uri().path(), "internal callback rejected");
    ApiError::unauthorized("missing or invalid bearer token").into_response()
}
