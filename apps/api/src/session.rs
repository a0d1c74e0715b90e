use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::backend::{AuthProvider, AuthUser, BackendError};
use crate::errors::AppError;

/// Access token from an `Authorization: Bearer <token>` header.
/// Use `Option<BearerToken>` where anonymous callers are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| BearerToken(token.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

/// The caller's identity, passed explicitly to every operation that acts on
/// behalf of a user.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

impl Session {
    /// Asks the auth service who owns `token`.
    pub async fn resolve(auth: &dyn AuthProvider, token: BearerToken) -> Result<Self, AppError> {
        match auth.current_user(&token.0).await {
            Ok(user) => Ok(Session {
                access_token: token.0,
                user,
            }),
            Err(BackendError::Unauthorized) => {
                debug!("Rejected unknown or expired access token");
                Err(AppError::Unauthorized)
            }
            Err(e) => Err(AppError::remote("認証情報の確認に失敗しました", e)),
        }
    }
}
