//! Ingest Video Gateway
//!
//! Web front-end for the Ingest video API, in two independent variants:
//!
//! # Features
//! - Client-credentials authentication with a process-wide service token
//! - OAuth2 authorization-code login with session-bound user tokens
//! - CSRF state verification on the OAuth callback
//! - Token revocation on logout
//! - Video listing and playback target selection

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod server;
pub mod session;

pub use auth::{
    AuthenticatedClient, AuthorizationCodeFlow, AuthorizationState, BearerToken,
    RedirectTarget, TokenAuthenticator,
};
pub use config::{IngestConfig, ServiceCredential};
pub use error::{IngestError, Result};
pub use gateway::{select_playback_url, Video, VideoGateway, VideoTarget};
pub use server::{start_server, Variant};
pub use session::{SessionId, SessionTokenStore, UserSession};

/// Re-export cookie key type for building the user-authorization router.
pub use axum_extra::extract::cookie::Key as CookieKey;
