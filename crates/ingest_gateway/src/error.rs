use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Failures surfaced by the authentication core and the video gateway.
///
/// HTTP failures carry the upstream status so callers can tell "the request
/// failed" apart from "there was no data".
#[derive(Error, Debug)]
pub enum IngestError {
    /// The token endpoint rejected the service credentials.
    #[error("Authentication failed: token endpoint returned {status}")]
    Authentication { status: u16 },

    /// The callback `state` did not match the nonce issued at login.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// The authorization code could not be exchanged for a token.
    #[error("Token exchange failed: token endpoint returned {status}")]
    TokenExchange { status: u16 },

    /// The video API answered with a non-success status.
    #[error("Request failed - ingest status code: {status}")]
    Upstream { status: u16 },

    /// The revoke call made during logout failed.
    #[error("Token revocation failed: ingest status code {status}")]
    Revocation { status: u16 },

    /// Network-level failure, no response available.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider redirected back with an `error` parameter.
    #[error("Authorization denied: {error} ({description})")]
    AuthorizationDenied { error: String, description: String },

    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// No bearer token is established for this session.
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Upstream HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status }
            | Self::TokenExchange { status }
            | Self::Upstream { status }
            | Self::Revocation { status } => Some(*status),
            _ => None,
        }
    }

    /// True when the video API rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Upstream { status: 401 })
    }
}
