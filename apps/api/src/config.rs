use anyhow::{bail, Context, Result};

/// Which implementation backs the auth and data interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Hosted GoTrue auth + PostgREST data API.
    Supabase {
        url: String,
        anon_key: String,
        /// Appended to every table name, e.g. `_syukatu` -> `es_entries_syukatu`.
        table_suffix: String,
    },
    /// Process-local store. Data is lost on restart.
    Memory,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    /// Only addresses under this domain may sign up (e.g. `example-u.ac.jp`).
    pub institution_email_domain: String,
    /// Where the emailed sign-in link sends the user after confirmation.
    pub signup_redirect_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let backend = match optional_env("DATA_BACKEND").as_deref() {
            None | Some("supabase") => BackendConfig::Supabase {
                url: require_env("SUPABASE_URL")?
                    .trim_end_matches('/')
                    .to_string(),
                anon_key: require_env("SUPABASE_ANON_KEY")?,
                table_suffix: optional_env("SUPABASE_TABLE_SUFFIX").unwrap_or_default(),
            },
            Some("memory") => BackendConfig::Memory,
            Some(other) => bail!("DATA_BACKEND must be 'supabase' or 'memory', got '{other}'"),
        };

        let institution_email_domain = require_env("INSTITUTION_EMAIL_DOMAIN")?
            .trim_start_matches('@')
            .to_ascii_lowercase();

        Ok(Config {
            backend,
            institution_email_domain,
            signup_redirect_url: optional_env("SIGNUP_REDIRECT_URL"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
