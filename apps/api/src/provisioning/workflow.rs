use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::{AuthProvider, AuthSession, AuthUser, BackendError, RecordStore};
use crate::errors::AppError;
use crate::models::user::UserProfile;
use crate::provisioning::validation::{
    validate_institutional_email, validate_profile_form, ProfileForm,
};
use crate::provisioning::{CompletionPhase, ProvisioningError};
use crate::session::{BearerToken, Session};

/// Where an account stands in the signup → confirmation → profile sequence.
///
/// Never stored: re-derived from the auth service and the `users` table on
/// every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProvisioningState {
    Unauthenticated,
    /// A sign-in link was emailed; confirmation happens out of band.
    PendingConfirmation { email: String },
    /// Signed in, but `profile` is missing or lacks name/department.
    AuthenticatedIncompleteProfile {
        user: AuthUser,
        profile: Option<UserProfile>,
    },
    AuthenticatedComplete {
        user: AuthUser,
        profile: UserProfile,
    },
}

impl ProvisioningState {
    fn from_lookup(user: AuthUser, profile: Option<UserProfile>) -> Self {
        match profile {
            Some(profile) if profile.is_complete() => {
                ProvisioningState::AuthenticatedComplete { user, profile }
            }
            profile => ProvisioningState::AuthenticatedIncompleteProfile { user, profile },
        }
    }

    /// True when the caller must be shown the profile-completion form.
    pub fn requires_profile_form(&self) -> bool {
        matches!(
            self,
            ProvisioningState::AuthenticatedIncompleteProfile { .. }
        )
    }
}

/// Drives account provisioning against the injected auth and data backends.
pub struct ProvisioningService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn RecordStore>,
    email_domain: String,
    redirect_url: Option<String>,
}

impl ProvisioningService {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn RecordStore>,
        email_domain: String,
        redirect_url: Option<String>,
    ) -> Self {
        Self {
            auth,
            store,
            email_domain,
            redirect_url,
        }
    }

    /// `Unauthenticated → PendingConfirmation`. Addresses outside the
    /// institutional domain are rejected before the auth service is called.
    pub async fn request_signup(&self, email: &str) -> Result<ProvisioningState, ProvisioningError> {
        let email = email.trim();
        validate_institutional_email(email, &self.email_domain)?;

        self.auth
            .send_sign_in_link(email, self.redirect_url.as_deref())
            .await
            .map_err(ProvisioningError::SignupFailed)?;

        info!("Sign-in link sent to {email}");
        Ok(ProvisioningState::PendingConfirmation {
            email: email.to_string(),
        })
    }

    /// Password login for accounts that finished provisioning.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProvisioningError> {
        match self.auth.sign_in_with_password(email.trim(), password).await {
            Ok(session) => {
                info!("User {} signed in", session.user.id);
                Ok(session)
            }
            Err(BackendError::InvalidCredentials) => Err(ProvisioningError::InvalidCredentials),
            Err(e) => Err(ProvisioningError::SignInFailed(e)),
        }
    }

    pub async fn sign_out(&self, session: &Session) -> Result<(), ProvisioningError> {
        self.auth
            .sign_out(&session.access_token)
            .await
            .map_err(ProvisioningError::SignOutFailed)?;
        info!("User {} signed out", session.user.id);
        Ok(())
    }

    /// Re-derives the state for an optional access token. Missing or
    /// rejected tokens yield `Unauthenticated`.
    pub async fn derive_state(
        &self,
        token: Option<BearerToken>,
    ) -> Result<ProvisioningState, ProvisioningError> {
        let Some(token) = token else {
            return Ok(ProvisioningState::Unauthenticated);
        };
        let user = match self.auth.current_user(&token.0).await {
            Ok(user) => user,
            Err(BackendError::Unauthorized) => return Ok(ProvisioningState::Unauthenticated),
            Err(e) => return Err(ProvisioningError::StateLookup(e)),
        };
        let session = Session {
            access_token: token.0,
            user,
        };
        self.state_for(&session).await
    }

    /// State of an already-resolved session, from its `users` row.
    pub async fn state_for(&self, session: &Session) -> Result<ProvisioningState, ProvisioningError> {
        let profile = self
            .store
            .fetch_profile(&session.access_token, session.user.id)
            .await
            .map_err(|e| match e {
                BackendError::Unauthorized => ProvisioningError::NotAuthenticated,
                e => ProvisioningError::StateLookup(e),
            })?;
        Ok(ProvisioningState::from_lookup(session.user.clone(), profile))
    }

    /// `AuthenticatedIncompleteProfile → AuthenticatedComplete`.
    ///
    /// Validation failures return before any remote call. The two remote
    /// writes run in order (credential, then profile) and are both
    /// idempotent, so after a failure in either phase the caller resubmits
    /// the same form.
    pub async fn complete_profile(
        &self,
        session: &Session,
        form: ProfileForm,
    ) -> Result<UserProfile, ProvisioningError> {
        validate_profile_form(&form)?;

        let existing = match self.state_for(session).await? {
            ProvisioningState::AuthenticatedComplete { .. } => {
                return Err(ProvisioningError::AlreadyProvisioned)
            }
            ProvisioningState::AuthenticatedIncompleteProfile { profile, .. } => profile,
            _ => None,
        };

        let email = session
            .user
            .email
            .clone()
            .or_else(|| existing.map(|profile| profile.email))
            .ok_or(ProvisioningError::MalformedEmail)?;

        self.auth
            .update_password(&session.access_token, &form.password)
            .await
            .map_err(|source| {
                warn!("Credential update failed for user {}", session.user.id);
                ProvisioningError::Completion {
                    phase: CompletionPhase::CredentialUpdate,
                    source,
                }
            })?;

        let profile = UserProfile {
            id: session.user.id,
            email,
            name: Some(form.name.trim().to_string()),
            department: Some(form.department),
        };

        self.store
            .upsert_profile(&session.access_token, &profile)
            .await
            .map_err(|source| {
                warn!(
                    "Profile write failed for user {} after credential update; awaiting resubmission",
                    session.user.id
                );
                ProvisioningError::Completion {
                    phase: CompletionPhase::ProfileWrite {
                        credential_updated: true,
                    },
                    source,
                }
            })?;

        info!("User {} completed provisioning", session.user.id);
        Ok(profile)
    }

    /// Gate for the record pages: a valid token whose profile is complete.
    pub async fn require_complete(
        &self,
        token: BearerToken,
    ) -> Result<(Session, UserProfile), AppError> {
        let session = Session::resolve(self.auth.as_ref(), token).await?;
        match self.state_for(&session).await? {
            ProvisioningState::AuthenticatedComplete { profile, .. } => Ok((session, profile)),
            _ => Err(AppError::ProfileIncomplete),
        }
    }
}
