//! Supabase client: the single point of entry for all calls to the hosted
//! auth service (GoTrue, `/auth/v1`) and data API (PostgREST, `/rest/v1`).
//!
//! No request is retried; every failure is reported to the caller as-is.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::backend::{AuthProvider, AuthSession, AuthUser, BackendError, RecordStore, Table};
use crate::models::user::UserProfile;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordUpdate<'a> {
    password: &'a str,
}

/// GoTrue and PostgREST disagree on the error field name.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    table_suffix: String,
}

impl SupabaseClient {
    pub fn new(base_url: String, anon_key: String, table_suffix: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url,
            anon_key,
            table_suffix,
        })
    }

    /// Concrete table name, e.g. `es_entries_syukatu`.
    pub fn table_name(&self, table: Table) -> String {
        format!("{}{}", table.base_name(), self.table_suffix)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table_name(table))
    }

    /// Attaches the project key and, when given, the caller's access token.
    /// Without a user token the anon key doubles as the bearer.
    fn authorized(&self, builder: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 {
            debug!("Supabase rejected access token: {body}");
            return Err(BackendError::Unauthorized);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or(body);
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(BackendError::Parse)
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn send_sign_in_link(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut request = self.authorized(self.client.post(self.auth_url("otp")), None);
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        self.send(request.json(&OtpRequest {
            email,
            create_user: true,
        }))
        .await?;
        debug!("Sign-in link requested for {email}");
        Ok(())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let request = self
            .authorized(self.client.post(self.auth_url("token")), None)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password });

        match self.send_json(request).await {
            Err(BackendError::Api { status: 400, .. }) => Err(BackendError::InvalidCredentials),
            other => other,
        }
    }

    async fn current_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let request = self.authorized(self.client.get(self.auth_url("user")), Some(access_token));
        match self.send_json(request).await {
            Err(BackendError::Api { status: 403, .. }) => Err(BackendError::Unauthorized),
            other => other,
        }
    }

    async fn update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let request = self
            .authorized(self.client.put(self.auth_url("user")), Some(access_token))
            .json(&PasswordUpdate { password });
        self.send(request).await?;
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let request =
            self.authorized(self.client.post(self.auth_url("logout")), Some(access_token));
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> Result<Option<UserProfile>, BackendError> {
        let id_filter = format!("eq.{user_id}");
        let request = self
            .authorized(self.client.get(self.rest_url(Table::Users)), Some(access_token))
            .query(&[
                ("select", "id,email,name,department"),
                ("id", id_filter.as_str()),
            ]);
        let rows: Vec<UserProfile> = self.send_json(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(
        &self,
        access_token: &str,
        profile: &UserProfile,
    ) -> Result<(), BackendError> {
        let request = self
            .authorized(self.client.post(self.rest_url(Table::Users)), Some(access_token))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&json!([profile]));
        self.send(request).await?;
        Ok(())
    }

    async fn select_with_author(
        &self,
        access_token: &str,
        table: Table,
    ) -> Result<Vec<Value>, BackendError> {
        let select = format!("*,author:{}(name,department)", self.table_name(Table::Users));
        let request = self
            .authorized(self.client.get(self.rest_url(table)), Some(access_token))
            .query(&[("select", select.as_str()), ("order", "created_at.desc")]);
        let rows: Vec<Value> = self.send_json(request).await?;
        debug!("Fetched {} rows from {}", rows.len(), self.table_name(table));
        Ok(rows)
    }

    async fn insert(
        &self,
        access_token: &str,
        table: Table,
        row: Value,
    ) -> Result<Value, BackendError> {
        let request = self
            .authorized(self.client.post(self.rest_url(table)), Some(access_token))
            .header("Prefer", "return=representation")
            .json(&json!([row]));
        let rows: Vec<Value> = self.send_json(request).await?;
        rows.into_iter().next().ok_or_else(|| BackendError::Api {
            status: 200,
            message: format!("insert into {} returned no row", self.table_name(table)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(suffix: &str) -> SupabaseClient {
        SupabaseClient::new(
            "https://project.supabase.co".to_string(),
            "anon".to_string(),
            suffix.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_table_name_applies_suffix() {
        let c = client("_syukatu");
        assert_eq!(c.table_name(Table::EsEntries), "es_entries_syukatu");
        assert_eq!(c.table_name(Table::Users), "users_syukatu");
    }

    #[test]
    fn test_urls_without_suffix() {
        let c = client("");
        assert_eq!(
            c.rest_url(Table::CodingTests),
            "https://project.supabase.co/rest/v1/coding_tests"
        );
        assert_eq!(c.auth_url("otp"), "https://project.supabase.co/auth/v1/otp");
    }

    #[test]
    fn test_error_body_prefers_message_fields() {
        let gotrue: ErrorBody =
            serde_json::from_str(r#"{"code":422,"msg":"Signups not allowed"}"#).unwrap();
        assert_eq!(gotrue.into_message().as_deref(), Some("Signups not allowed"));

        let postgrest: ErrorBody = serde_json::from_str(
            r#"{"code":"42501","message":"new row violates row-level security policy"}"#,
        )
        .unwrap();
        assert!(postgrest.into_message().unwrap().contains("row-level security"));
    }
}
