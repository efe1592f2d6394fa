//! Token acquisition and attachment for outbound Ingest API calls.

pub mod authorization_code;
pub mod client;
pub mod client_credentials;
pub mod token;

pub use authorization_code::{AuthorizationCodeFlow, RedirectTarget};
pub use client::AuthenticatedClient;
pub use client_credentials::TokenAuthenticator;
pub use token::{AuthorizationState, BearerToken};
