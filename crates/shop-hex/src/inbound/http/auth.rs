use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::{HeaderMap, AUTHORIZATION};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use shop_types::domain::user::{Credentials, Principal, Registration};
use shop_types::ports::Store;

use super::server::AppState;
use crate::errors::AppError;

/// The caller resolved from an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S: Store> FromRequestParts<AppState<S>> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;
        state.auth.authenticate(token).map(Authenticated)
    }
}

/// Turns a body rejection into the same 400 shape as a failed validation.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v).map_err(|rejection| AppError::Validation {
        details: vec![rejection.body_text()],
    })
}

pub(crate) async fn register<S: Store>(
    State(state): State<AppState<S>>,
    body: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (user, token) = state.auth.register(json_body(body)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
            "token": token,
        })),
    ))
}

pub(crate) async fn login<S: Store>(
    State(state): State<AppState<S>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let token = state.auth.login(json_body(body)?).await?;
    Ok(Json(json!({ "token": token })))
}

pub(crate) async fn profile<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
) -> Result<Json<Value>, AppError> {
    let user = state.auth.profile(&actor).await?;
    Ok(Json(json!({ "user": user })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
