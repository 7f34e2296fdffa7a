use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_ASHBY_BASE_URL: &str = "https://api.ashbyhq.com";

/// Application configuration loaded from environment variables.
/// Startup fails if the upstream credential or the login passkey is missing.
#[derive(Clone)]
pub struct Config {
    pub ashby_api_key: String,
    pub ashby_base_url: String,
    pub ashby_timeout: Duration,
    pub app_passkey: String,
    /// Cookie signing secret. `None` means a fresh key is generated per process,
    /// which logs everyone out on restart.
    pub session_secret: Option<String>,
    pub default_pdfs_per_file: usize,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("ashby_base_url", &self.ashby_base_url)
            .field("ashby_timeout", &self.ashby_timeout)
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<set>"))
            .field("default_pdfs_per_file", &self.default_pdfs_per_file)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so it can be exercised
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret = lookup("SESSION_SECRET").filter(|s| !s.is_empty());
        if let Some(secret) = &session_secret {
            if secret.len() < 32 {
                bail!("SESSION_SECRET must be at least 32 bytes long");
            }
        }

        let default_pdfs_per_file: usize = parse_or(&lookup, "DEFAULT_PDFS_PER_FILE", 10)?;
        if default_pdfs_per_file == 0 {
            bail!("DEFAULT_PDFS_PER_FILE must be at least 1");
        }
        let max_upload_mb: usize = parse_or(&lookup, "MAX_UPLOAD_MB", 100)?;

        Ok(Config {
            ashby_api_key: require(&lookup, "ASHBY_API_KEY")?,
            ashby_base_url: lookup("ASHBY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ASHBY_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            ashby_timeout: Duration::from_secs(parse_or(&lookup, "ASHBY_TIMEOUT_SECS", 30)?),
            app_passkey: require(&lookup, "APP_PASSKEY")?,
            session_secret,
            default_pdfs_per_file,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            port: parse_or(&lookup, "PORT", 5000)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
