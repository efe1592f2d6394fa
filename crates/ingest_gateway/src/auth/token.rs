use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Deserialize;

/// Opaque bearer credential for the Ingest API.
///
/// Never empty once issued. `Debug` redacts the token so it can't leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    access_token: String,
    obtained_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    /// Returns `None` for an empty token string.
    pub fn new(access_token: impl Into<String>) -> Option<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return None;
        }
        Some(Self {
            access_token,
            obtained_at: Utc::now(),
            expires_at: None,
        })
    }

    pub(crate) fn from_response(response: TokenResponse) -> Option<Self> {
        let mut token = Self::new(response.access_token)?;
        // An `expires_in` chrono cannot represent means no known expiry.
        token.expires_at = response
            .expires_in
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| token.obtained_at.checked_add_signed(lifetime));
        Some(token)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Informational only: nothing refreshes an expired token.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// CSRF nonce binding an authorization request to its callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationState {
    pub state_nonce: String,
}

impl AuthorizationState {
    /// Fresh random nonce: 24 random bytes, base64url without padding (32 chars).
    pub fn generate() -> Self {
        let random_bytes: [u8; 24] = rand::thread_rng().gen();
        Self {
            state_nonce: URL_SAFE_NO_PAD.encode(random_bytes),
        }
    }

    pub fn matches(&self, received: &str) -> bool {
        self.state_nonce == received
    }
}

/// Token endpoint response, shared by both grants.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}
