//! Data-access interfaces for the hosted auth service and data store.
//!
//! Workflows only see `AuthProvider` and `RecordStore`. `AppState` carries
//! them as `Arc<dyn ..>`, built at startup from `BackendConfig`.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::models::user::UserProfile;

pub mod memory;
pub mod supabase;

pub use memory::InMemoryBackend;
pub use supabase::SupabaseClient;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("access token missing, expired or revoked")]
    Unauthorized,
}

/// Identity the auth service reports for an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by a successful password login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Logical tables. The concrete name may carry a deployment suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    EsEntries,
    CodingTests,
    Interviews,
}

impl Table {
    pub fn base_name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::EsEntries => "es_entries",
            Table::CodingTests => "coding_tests",
            Table::Interviews => "interviews",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

/// Hosted authentication: sign-in links, password login, credential update.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Emails a one-time sign-in link, creating the account if needed.
    async fn send_sign_in_link(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), BackendError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError>;

    async fn current_user(&self, access_token: &str) -> Result<AuthUser, BackendError>;

    /// Sets the password of the account behind `access_token`. Repeating the
    /// call with the same password leaves the account unchanged.
    async fn update_password(&self, access_token: &str, password: &str)
        -> Result<(), BackendError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;
}

/// Hosted relational store. Row-level rules are enforced on the other side:
/// every caller reads all rows, writes only rows it owns.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> Result<Option<UserProfile>, BackendError>;

    /// Inserts the profile or overwrites the row with the same id.
    async fn upsert_profile(
        &self,
        access_token: &str,
        profile: &UserProfile,
    ) -> Result<(), BackendError>;

    /// All rows of `table`, newest first, each joined with its owner's
    /// `name`/`department` under the `author` key.
    async fn select_with_author(
        &self,
        access_token: &str,
        table: Table,
    ) -> Result<Vec<Value>, BackendError>;

    /// Inserts one row and returns it as stored (with `id` and `created_at`).
    async fn insert(&self, access_token: &str, table: Table, row: Value)
        -> Result<Value, BackendError>;
}

/// Auth and data handles sharing one underlying connection.
pub struct Backend {
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn RecordStore>,
}

/// Builds the configured backend.
pub fn connect(config: &BackendConfig) -> Result<Backend> {
    match config {
        BackendConfig::Supabase {
            url,
            anon_key,
            table_suffix,
        } => {
            let client = Arc::new(SupabaseClient::new(
                url.clone(),
                anon_key.clone(),
                table_suffix.clone(),
            )?);
            info!("Supabase backend configured at {url}");
            Ok(Backend {
                auth: client.clone(),
                store: client,
            })
        }
        BackendConfig::Memory => {
            let backend = Arc::new(InMemoryBackend::default());
            info!("In-memory backend configured; data will not survive a restart");
            Ok(Backend {
                auth: backend.clone(),
                store: backend,
            })
        }
    }
}
