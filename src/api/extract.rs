//! Bearer-token extractors. Each extractor pins one token domain and one
//! role, so a handler's signature states its access requirement.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::auth::{Claims, Role, TokenDomain};

/// Admin-domain bearer token.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: i32,
}

/// Standard-domain bearer token with the student role.
#[derive(Debug, Clone)]
pub struct CurrentStudent {
    pub claims: Claims,
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
}

impl FromRequestParts<Arc<AppState>> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.validate(token, TokenDomain::Admin)?;

        if claims.role != Role::Admin {
            return Err(ApiError::unauthorized("Admin access required"));
        }

        tracing::Span::current().record("user_id", claims.id);
        Ok(Self { id: claims.id })
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.validate(token, TokenDomain::Standard)?;

        if claims.role != Role::Student {
            return Err(ApiError::unauthorized("Student access required"));
        }

        tracing::Span::current().record("user_id", claims.id);
        Ok(Self { claims })
    }
}
