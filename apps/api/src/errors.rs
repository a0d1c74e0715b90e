use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Messages carried by `Validation` and `Conflict` are shown to the user as-is.
/// Remote failures are logged with their cause and replaced by `message`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Profile incomplete")]
    ProfileIncomplete,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Remote error ({message}): {source}")]
    Remote {
        message: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn remote(message: &'static str, source: BackendError) -> Self {
        AppError::Remote { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::ProfileIncomplete => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Remote { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The localized text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Unauthorized => "認証されていません".to_string(),
            AppError::ProfileIncomplete => {
                "サービスを利用するためにプロフィール登録が必要です".to_string()
            }
            AppError::Remote { message, .. } => (*message).to_string(),
            AppError::Internal(_) => "エラーが発生しました。もう一度お試しください。".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Remote { message, source } => {
                tracing::error!("Remote error ({message}): {source}");
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
            }
            _ => {}
        }

        let body = Json(json!({
            "error": {
                "message": self.user_message()
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Shown for request bodies or query strings that do not decode.
const MALFORMED_INPUT: &str = "入力内容が正しくありません";

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        AppError::Validation(MALFORMED_INPUT.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::Validation(MALFORMED_INPUT.to_string())
    }
}
