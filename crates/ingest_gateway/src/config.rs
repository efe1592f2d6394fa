//! Static configuration for both front-end variants.
//!
//! Everything here is read once at startup and never mutated afterwards.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{IngestError, Result};

pub const DEFAULT_AUTHORIZE_URL: &str = "https://login.ingest.io/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://login.ingest.io/token";
pub const DEFAULT_API_URL: &str = "https://api.ingest.io";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5000/oauth/callback";
pub const DEFAULT_SCOPE: &str = "read_videos";
pub const DEFAULT_MEDIA_TYPE: &str = "application/vnd.ingest.v1+json";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Service-level client credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredential {
    pub client_id: String,
    pub client_secret: String,
}

impl ServiceCredential {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCredential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Ingest provider configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub credential: ServiceCredential,
    pub authorize_url: Url,
    pub token_url: Url,
    pub base_api_url: Url,
    pub redirect_uri: Url,
    pub scope: String,
    pub media_type: String,
    pub request_timeout: Duration,
    /// Key material for the session cookie. A random key is generated when unset.
    pub session_secret: Option<Vec<u8>>,
}

impl IngestConfig {
    /// Configuration pointing at the public Ingest endpoints.
    pub fn new(credential: ServiceCredential) -> Result<Self> {
        Ok(Self {
            credential,
            authorize_url: parse_url("authorize_url", DEFAULT_AUTHORIZE_URL)?,
            token_url: parse_url("token_url", DEFAULT_TOKEN_URL)?,
            base_api_url: parse_url("base_api_url", DEFAULT_API_URL)?,
            redirect_uri: parse_url("redirect_uri", DEFAULT_REDIRECT_URI)?,
            scope: DEFAULT_SCOPE.to_string(),
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session_secret: None,
        })
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `INGEST_CLIENT_ID`
    /// - `INGEST_CLIENT_SECRET`
    ///
    /// # Optional env vars
    /// - `INGEST_AUTHORIZE_URL`, `INGEST_TOKEN_URL`, `INGEST_API_URL`,
    ///   `INGEST_REDIRECT_URI`: endpoint overrides
    /// - `INGEST_SCOPE`: scope requested for both grants (default `read_videos`)
    /// - `INGEST_REQUEST_TIMEOUT_SECS`: outbound request timeout (default 5)
    /// - `SESSION_SECRET`: session cookie key, at least 64 bytes
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self> {
        let client_id = required_env("INGEST_CLIENT_ID")?;
        let client_secret = required_env("INGEST_CLIENT_SECRET")?;

        let mut config = Self::new(ServiceCredential::new(client_id, client_secret))?;

        if let Ok(value) = std::env::var("INGEST_AUTHORIZE_URL") {
            config = config.with_authorize_url(parse_url("INGEST_AUTHORIZE_URL", &value)?);
        }
        if let Ok(value) = std::env::var("INGEST_TOKEN_URL") {
            config = config.with_token_url(parse_url("INGEST_TOKEN_URL", &value)?);
        }
        if let Ok(value) = std::env::var("INGEST_API_URL") {
            config = config.with_base_api_url(parse_url("INGEST_API_URL", &value)?);
        }
        if let Ok(value) = std::env::var("INGEST_REDIRECT_URI") {
            config = config.with_redirect_uri(parse_url("INGEST_REDIRECT_URI", &value)?);
        }
        if let Ok(scope) = std::env::var("INGEST_SCOPE") {
            config = config.with_scope(scope);
        }
        if let Ok(value) = std::env::var("INGEST_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = value
                .parse()
                .map_err(|e| IngestError::Config(format!("INGEST_REQUEST_TIMEOUT_SECS: {e}")))?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Ok(secret) = std::env::var("SESSION_SECRET") {
            if secret.len() < 64 {
                return Err(IngestError::Config(
                    "SESSION_SECRET must be at least 64 bytes".into(),
                ));
            }
            config.session_secret = Some(secret.into_bytes());
        }

        Ok(config)
    }

    pub fn with_authorize_url(mut self, url: Url) -> Self {
        self.authorize_url = url;
        self
    }

    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    pub fn with_base_api_url(mut self, url: Url) -> Self {
        self.base_api_url = url;
        self
    }

    pub fn with_redirect_uri(mut self, url: Url) -> Self {
        self.redirect_uri = url;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Absolute URL of an API path, e.g. `api_endpoint("videos")`.
    pub fn api_endpoint(&self, path: &str) -> String {
        join_endpoint(&self.base_api_url, path)
    }

    /// Outbound HTTP client shared by every component, bounded by `request_timeout`.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(IngestError::Transport)
    }
}

/// Join a base URL and a path with exactly one slash between them.
pub fn join_endpoint(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| IngestError::Config(format!("{name} is required")))
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    value
        .parse()
        .map_err(|e| IngestError::Config(format!("{name}: {e}")))
}
