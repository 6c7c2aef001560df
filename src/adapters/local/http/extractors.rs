use super::error::ApiError;
use super::AppState;
use crate::domain::users::Principal;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Caller identified by a valid bearer token. Rejects with 401 otherwise.
pub struct AuthenticatedUser(pub Principal);

/// Caller of an optional-auth route. No `Authorization` header means
/// anonymous; a header carrying a bad token is still a 401.
pub struct MaybeUser(pub Option<Principal>);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(ApiError::Unauthorized("Invalid token".to_string())),
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(MaybeUser(Some(state.auth.verify(token)?))),
            None => Ok(MaybeUser(None)),
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(principal)) => Ok(AuthenticatedUser(principal)),
            MaybeUser(None) => Err(ApiError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}
