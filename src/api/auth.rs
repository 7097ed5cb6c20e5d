//! Bearer token extractor
//!
//! Handlers that take an [`AuthUser`] only run for a valid
//! `Authorization: Bearer <token>` header.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::{DomainError, Role, UserProfile};

/// The signed-in user
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

impl AuthUser {
    pub fn profile(&self) -> &UserProfile {
        &self.0
    }

    pub fn uid(&self) -> &str {
        &self.0.uid
    }

    pub fn require_owner(&self) -> Result<(), ApiError> {
        self.require(Role::Owner)
    }

    pub fn require_tenant(&self) -> Result<(), ApiError> {
        self.require(Role::Tenant)
    }

    fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.0.role == role {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("{} only", role.as_str())))
        }
    }
}

/// Token from an `Authorization` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

        match state.users.authenticate(token).await {
            Ok(profile) => Ok(AuthUser(profile)),
            // a session without a profile is as good as none
            Err(DomainError::NotFound(m)) => Err(ApiError::Unauthorized(m)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer  abc123 "), Some("abc123"));
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc123"), None);
    }
}
