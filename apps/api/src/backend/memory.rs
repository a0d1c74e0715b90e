//! Process-local implementation of both backend interfaces.
//!
//! Mirrors the hosted service closely enough for workflows to be exercised
//! end to end: sign-in links must be confirmed before a token exists, writes
//! are checked against the token's owner, and listings join the author. It
//! also counts every call and can fail a chosen operation once.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::{AuthProvider, AuthSession, AuthUser, BackendError, RecordStore, Table};
use crate::models::user::UserProfile;

/// Operations that can be made to fail on their next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    SendLink,
    UpdatePassword,
    UpsertProfile,
    Select,
    Insert,
}

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    email: String,
    password: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    pending_links: HashSet<String>,
    tokens: HashMap<String, Uuid>,
    profiles: HashMap<Uuid, UserProfile>,
    rows: HashMap<Table, Vec<(DateTime<Utc>, Value)>>,
    failures: HashSet<FailurePoint>,
}

impl MemoryState {
    fn take_failure(&mut self, point: FailurePoint) -> Result<(), BackendError> {
        if self.failures.remove(&point) {
            return Err(BackendError::Api {
                status: 503,
                message: format!("injected failure at {point:?}"),
            });
        }
        Ok(())
    }

    fn owner_of(&self, access_token: &str) -> Result<Uuid, BackendError> {
        self.tokens
            .get(access_token)
            .copied()
            .ok_or(BackendError::Unauthorized)
    }

    fn issue_session(&mut self, account: &Account) -> AuthSession {
        let access_token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(access_token.clone(), account.id);
        AuthSession {
            access_token,
            refresh_token: Some(Uuid::new_v4().simple().to_string()),
            expires_in: Some(3600),
            user: AuthUser {
                id: account.id,
                email: Some(account.email.clone()),
            },
        }
    }
}

fn rls_violation(table: Table) -> BackendError {
    BackendError::Api {
        status: 403,
        message: format!("new row violates row-level security policy for table \"{table}\""),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
    calls: AtomicUsize,
}

impl InMemoryBackend {
    /// Number of auth/data calls received so far.
    pub fn remote_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes the next call of `point` fail with a 503.
    pub async fn fail_next(&self, point: FailurePoint) {
        self.state.lock().await.failures.insert(point);
    }

    pub async fn has_pending_link(&self, email: &str) -> bool {
        self.state
            .lock()
            .await
            .pending_links
            .contains(&email.to_lowercase())
    }

    /// Plays the part of the user clicking the emailed link: creates the
    /// account on first use and returns a fresh session. `None` when no link
    /// was sent to `email`.
    pub async fn confirm_sign_in_link(&self, email: &str) -> Option<AuthSession> {
        let key = email.to_lowercase();
        let mut state = self.state.lock().await;
        if !state.pending_links.remove(&key) {
            return None;
        }
        let account = state
            .accounts
            .entry(key)
            .or_insert_with(|| Account {
                id: Uuid::new_v4(),
                email: email.to_string(),
                password: None,
            })
            .clone();
        Some(state.issue_session(&account))
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthProvider for InMemoryBackend {
    async fn send_sign_in_link(
        &self,
        email: &str,
        _redirect_to: Option<&str>,
    ) -> Result<(), BackendError> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.take_failure(FailurePoint::SendLink)?;
        state.pending_links.insert(email.to_lowercase());
        Ok(())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        self.record_call();
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get(&email.to_lowercase())
            .filter(|account| account.password.as_deref() == Some(password))
            .cloned()
            .ok_or(BackendError::InvalidCredentials)?;
        Ok(state.issue_session(&account))
    }

    async fn current_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        self.record_call();
        let state = self.state.lock().await;
        let id = state.owner_of(access_token)?;
        let email = state
            .accounts
            .values()
            .find(|account| account.id == id)
            .map(|account| account.email.clone());
        Ok(AuthUser { id, email })
    }

    async fn update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.take_failure(FailurePoint::UpdatePassword)?;
        let id = state.owner_of(access_token)?;
        let account = state
            .accounts
            .values_mut()
            .find(|account| account.id == id)
            .ok_or(BackendError::Unauthorized)?;
        account.password = Some(password.to_string());
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        self.record_call();
        let mut state = self.state.lock().await;
        state
            .tokens
            .remove(access_token)
            .map(|_| ())
            .ok_or(BackendError::Unauthorized)
    }
}

#[async_trait]
impl RecordStore for InMemoryBackend {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> Result<Option<UserProfile>, BackendError> {
        self.record_call();
        let state = self.state.lock().await;
        state.owner_of(access_token)?;
        Ok(state.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(
        &self,
        access_token: &str,
        profile: &UserProfile,
    ) -> Result<(), BackendError> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.take_failure(FailurePoint::UpsertProfile)?;
        if state.owner_of(access_token)? != profile.id {
            return Err(rls_violation(Table::Users));
        }
        state.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn select_with_author(
        &self,
        access_token: &str,
        table: Table,
    ) -> Result<Vec<Value>, BackendError> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.take_failure(FailurePoint::Select)?;
        state.owner_of(access_token)?;

        // Newest first; equal timestamps keep the later insert first.
        let mut rows: Vec<&(DateTime<Utc>, Value)> = state
            .rows
            .get(&table)
            .map(|rows| rows.iter().rev().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.0.cmp(&a.0));

        let joined = rows
            .into_iter()
            .map(|(_, row)| {
                let author = row
                    .get("user_id")
                    .and_then(|id| id.as_str())
                    .and_then(|id| Uuid::parse_str(id).ok())
                    .and_then(|id| state.profiles.get(&id))
                    .map(|profile| json!({ "name": profile.name, "department": profile.department }))
                    .unwrap_or(Value::Null);
                let mut row = row.clone();
                if let Value::Object(columns) = &mut row {
                    columns.insert("author".to_string(), author);
                }
                row
            })
            .collect();
        Ok(joined)
    }

    async fn insert(
        &self,
        access_token: &str,
        table: Table,
        row: Value,
    ) -> Result<Value, BackendError> {
        self.record_call();
        let mut state = self.state.lock().await;
        state.take_failure(FailurePoint::Insert)?;
        let owner = state.owner_of(access_token)?;

        let Value::Object(mut columns) = row else {
            return Err(BackendError::Api {
                status: 400,
                message: "row must be a JSON object".to_string(),
            });
        };
        let row_owner = columns.get("user_id").and_then(|id| id.as_str());
        if row_owner != Some(owner.to_string().as_str()) {
            return Err(rls_violation(table));
        }

        let created_at = Utc::now();
        columns.insert("id".to_string(), json!(Uuid::new_v4()));
        columns.insert("created_at".to_string(), json!(created_at));
        let stored = Value::Object(columns);
        state
            .rows
            .entry(table)
            .or_default()
            .push((created_at, stored.clone()));
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_link_must_be_sent_before_confirmation() {
        let backend = InMemoryBackend::default();
        assert!(backend.confirm_sign_in_link("a@example-u.ac.jp").await.is_none());

        backend
            .send_sign_in_link("a@example-u.ac.jp", None)
            .await
            .unwrap();
        let session = backend.confirm_sign_in_link("a@example-u.ac.jp").await.unwrap();
        let user = backend.current_user(&session.access_token).await.unwrap();
        assert_eq!(user.id, session.user.id);
        assert_eq!(backend.remote_calls(), 2);
    }

    #[tokio::test]
    async fn test_insert_rejects_foreign_owner() {
        let backend = InMemoryBackend::default();
        backend.send_sign_in_link("a@example-u.ac.jp", None).await.unwrap();
        let session = backend.confirm_sign_in_link("a@example-u.ac.jp").await.unwrap();

        let err = backend
            .insert(
                &session.access_token,
                Table::EsEntries,
                json!({ "user_id": Uuid::new_v4(), "company_name": "Acme" }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_select_returns_newest_first_with_author() {
        let backend = InMemoryBackend::default();
        backend.send_sign_in_link("a@example-u.ac.jp", None).await.unwrap();
        let session = backend.confirm_sign_in_link("a@example-u.ac.jp").await.unwrap();
        let token = session.access_token.as_str();
        let owner = session.user.id;

        for company in ["First", "Second"] {
            backend
                .insert(token, Table::Interviews, json!({ "user_id": owner, "company_name": company }))
                .await
                .unwrap();
        }

        let rows = backend.select_with_author(token, Table::Interviews).await.unwrap();
        assert_eq!(rows[0]["company_name"], "Second");
        assert_eq!(rows[1]["company_name"], "First");
        assert!(rows[0]["author"].is_null(), "no profile yet, so no author");
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let backend = InMemoryBackend::default();
        backend.fail_next(FailurePoint::SendLink).await;
        assert!(backend.send_sign_in_link("a@example-u.ac.jp", None).await.is_err());
        assert!(backend.send_sign_in_link("a@example-u.ac.jp", None).await.is_ok());
    }
}
