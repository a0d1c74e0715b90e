use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::backend::AuthSession;
use crate::errors::AppError;
use crate::extract::JsonBody;
use crate::provisioning::validation::{validate_profile_form, ProfileForm};
use crate::provisioning::ProvisioningState;
use crate::session::{BearerToken, Session};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    #[serde(flatten)]
    pub state: ProvisioningState,
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let next = state.provisioning.request_signup(&req.email).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SignupResponse {
            state: next,
            message: "確認メールを送信しました。メール内のリンクをクリックして、アカウントを有効化してください。",
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let session = state.provisioning.sign_in(&req.email, &req.password).await?;
    Ok(Json(session))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<StatusCode, AppError> {
    let session = Session::resolve(state.auth.as_ref(), token).await?;
    state.provisioning.sign_out(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/me
pub async fn handle_me(
    State(state): State<AppState>,
    token: Option<BearerToken>,
) -> Result<Json<ProvisioningState>, AppError> {
    let current = state.provisioning.derive_state(token).await?;
    Ok(Json(current))
}

/// POST /api/v1/me/profile
pub async fn handle_complete_profile(
    State(state): State<AppState>,
    token: BearerToken,
    JsonBody(form): JsonBody<ProfileForm>,
) -> Result<Json<ProvisioningState>, AppError> {
    // Reject locally before the token lookup so a bad form costs no remote call.
    validate_profile_form(&form)?;

    let session = Session::resolve(state.auth.as_ref(), token).await?;
    let profile = state.provisioning.complete_profile(&session, form).await?;
    Ok(Json(ProvisioningState::AuthenticatedComplete {
        user: session.user,
        profile,
    }))
}
