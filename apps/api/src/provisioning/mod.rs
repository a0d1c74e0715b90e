// Account provisioning: institutional signup, sign-in link confirmation,
// mandatory profile completion before the record pages open up.

pub mod handlers;
pub mod validation;
pub mod workflow;

use std::fmt;

use thiserror::Error;

use crate::backend::BackendError;
use crate::errors::AppError;

pub use validation::{ProfileForm, MIN_PASSWORD_CHARS};
pub use workflow::{ProvisioningService, ProvisioningState};

/// The remote step profile completion had reached when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPhase {
    CredentialUpdate,
    /// The password may already be changed; resubmitting the whole form is safe.
    ProfileWrite { credential_updated: bool },
}

impl fmt::Display for CompletionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionPhase::CredentialUpdate => f.write_str("credential update"),
            CompletionPhase::ProfileWrite { credential_updated } => write!(
                f,
                "profile write (credential updated: {credential_updated})"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("malformed email address")]
    MalformedEmail,

    #[error("email address is outside the institutional domain")]
    NonInstitutionalEmail,

    #[error("name is required")]
    MissingName,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("password confirmation does not match")]
    PasswordMismatch,

    #[error("profile is already complete")]
    AlreadyProvisioned,

    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("access token missing, expired or revoked")]
    NotAuthenticated,

    #[error("sign-in link request failed: {0}")]
    SignupFailed(#[source] BackendError),

    #[error("login failed: {0}")]
    SignInFailed(#[source] BackendError),

    #[error("sign-out failed: {0}")]
    SignOutFailed(#[source] BackendError),

    #[error("loading account state failed: {0}")]
    StateLookup(#[source] BackendError),

    #[error("profile completion failed during {phase}: {source}")]
    Completion {
        phase: CompletionPhase,
        #[source]
        source: BackendError,
    },
}

impl From<ProvisioningError> for AppError {
    fn from(err: ProvisioningError) -> Self {
        match err {
            ProvisioningError::MalformedEmail | ProvisioningError::NonInstitutionalEmail => {
                AppError::Validation("大学のメールアドレスのみ登録可能です".to_string())
            }
            ProvisioningError::MissingName => {
                AppError::Validation("氏名を入力してください".to_string())
            }
            ProvisioningError::PasswordTooShort { min } => {
                AppError::Validation(format!("パスワードは{min}文字以上で入力してください"))
            }
            ProvisioningError::PasswordMismatch => {
                AppError::Validation("パスワードが一致しません".to_string())
            }
            ProvisioningError::AlreadyProvisioned => {
                AppError::Conflict("プロフィールは登録済みです".to_string())
            }
            ProvisioningError::InvalidCredentials => AppError::Validation(
                "メールアドレスまたはパスワードが正しくありません".to_string(),
            ),
            ProvisioningError::NotAuthenticated => AppError::Unauthorized,
            ProvisioningError::SignupFailed(e) => {
                AppError::remote("登録処理中にエラーが発生しました", e)
            }
            ProvisioningError::SignInFailed(e) => {
                AppError::remote("ログイン中にエラーが発生しました", e)
            }
            ProvisioningError::SignOutFailed(e) => {
                AppError::remote("ログアウトに失敗しました", e)
            }
            ProvisioningError::StateLookup(e) => {
                AppError::remote("プロフィールの読み込みに失敗しました", e)
            }
            ProvisioningError::Completion { source, .. } => AppError::remote(
                "プロフィールの更新に失敗しました。もう一度お試しください。",
                source,
            ),
        }
    }
}
