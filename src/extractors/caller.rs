//! Extract the authenticated caller from `Authorization: Bearer <token>`.

use crate::error::AppError;
use crate::identity::Identity;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Verified identity of the caller. Rejects with 401 when the credential is missing or invalid.
#[derive(Clone, Debug)]
pub struct Caller(pub Identity);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("bearer token required".into()))?;
        let identity = state.identity.identify(token).await?;
        Ok(Caller(identity))
    }
}
