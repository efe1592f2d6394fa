//! Ingest video front-end HTTP server.
//!
//! Serves one of two independent front-ends:
//! - client-credentials: one service token shared by every visitor
//! - user-authorization: each visitor logs in through the OAuth2
//!   authorization-code flow and gets a session-bound token

pub mod client_routes;
pub mod user_routes;
pub mod views;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Router;
use axum_extra::extract::cookie::Key;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{AuthenticatedClient, AuthorizationCodeFlow, TokenAuthenticator};
use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::gateway::VideoGateway;

pub use client_routes::{client_credentials_router, ClientCredentialsState};
pub use user_routes::{user_authorization_router, UserAuthState};

/// Which front-end to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    ClientCredentials,
    UserAuthorization,
}

/// Start the front-end HTTP server.
///
/// The client-credentials variant authenticates once before binding, so bad
/// service credentials stop the process at startup.
///
/// # Errors
/// Returns error if authentication, configuration or server binding fails
pub async fn start_server(
    config: IngestConfig,
    variant: Variant,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let http = config.http_client()?;

    let app = match variant {
        Variant::ClientCredentials => {
            let authenticator = TokenAuthenticator::from_config(&config, http.clone());
            let token = authenticator
                .authenticate(&config.credential)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to authenticate with Ingest: {}", e))?;
            let client = AuthenticatedClient::new(http, &config.media_type, token)?;
            let gateway = VideoGateway::new(client, config.base_api_url.clone());

            client_credentials_router(ClientCredentialsState::new(
                gateway,
                authenticator,
                config.credential.clone(),
            ))
        }
        Variant::UserAuthorization => {
            let key = cookie_key(&config)?;
            let flow = AuthorizationCodeFlow::new(config, http.clone());
            user_authorization_router(UserAuthState::new(flow, http, key))
        }
    };

    let app: Router = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    info!(?variant, "Ingest front-end listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn cookie_key(config: &IngestConfig) -> Result<Key, IngestError> {
    match &config.session_secret {
        Some(secret) => Key::try_from(secret.as_slice())
            .map_err(|_| IngestError::Config("SESSION_SECRET must be at least 64 bytes".into())),
        None => {
            tracing::warn!("SESSION_SECRET not set, sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let (status, heading) = match &self {
            Self::NotAuthenticated => return Redirect::to("/").into_response(),
            Self::StateMismatch | Self::InvalidCallback(_) => {
                (StatusCode::BAD_REQUEST, "Login failed")
            }
            Self::AuthorizationDenied { .. } => (StatusCode::UNAUTHORIZED, "Login failed"),
            Self::TokenExchange { .. } => (StatusCode::BAD_GATEWAY, "Login failed"),
            Self::Authentication { .. } => (StatusCode::BAD_GATEWAY, "Authentication failed"),
            Self::Revocation { .. } => (StatusCode::BAD_GATEWAY, "Logout failed"),
            Self::Upstream { .. } | Self::Decode(_) => (StatusCode::BAD_GATEWAY, "Request failed"),
            Self::Transport(_) => (StatusCode::BAD_GATEWAY, "Ingest is unreachable"),
            Self::Config(_) => {
                tracing::error!(error = %self, "Front-end configuration error");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
            }
        };

        (status, views::failure(heading, &self.to_string())).into_response()
    }
}
