//! Three-legged OAuth2 authorization-code flow against the Ingest login service.
//!
//! A session moves `UNAUTHENTICATED → PENDING → AUTHENTICATED`:
//! [`begin_login`](AuthorizationCodeFlow::begin_login) stores a state nonce
//! and yields the provider redirect, the callback is checked against that nonce
//! and exchanged for a token, and [`logout`](AuthorizationCodeFlow::logout)
//! revokes the token and empties the session.

use std::collections::HashMap;

use reqwest::header::ACCEPT;
use reqwest::Method;
use url::Url;

use super::client::AuthenticatedClient;
use super::token::{AuthorizationState, BearerToken, TokenResponse};
use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::session::UserSession;

const REVOKE_PATH: &str = "users/me/revoke";

/// Where to send the browser to start a login.
#[derive(Debug, Clone)]
pub struct RedirectTarget {
    pub url: Url,
}

pub struct AuthorizationCodeFlow {
    config: IngestConfig,
    http: reqwest::Client,
}

impl AuthorizationCodeFlow {
    pub fn new(config: IngestConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Issue a fresh state nonce, store it as the session's pending state and
    /// build the provider authorization URL. Replaces any earlier pending nonce.
    pub fn begin_login(&self, session: &mut UserSession, scope: &str) -> RedirectTarget {
        let state = AuthorizationState::generate();

        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.credential.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", scope)
            .append_pair("state", &state.state_nonce);

        session.oauth_state = Some(state);
        tracing::info!(scope, "Starting Ingest authorization");

        RedirectTarget { url }
    }

    /// Validate the provider callback and exchange its code for a token.
    ///
    /// `pending` is the nonce stored by the most recent
    /// [`begin_login`](Self::begin_login); callers take it out of the session
    /// before calling, so a nonce is never accepted twice.
    ///
    /// # Errors
    ///
    /// - [`IngestError::AuthorizationDenied`] when the callback carries `error`
    /// - [`IngestError::StateMismatch`] when no login is pending or `state` differs
    /// - [`IngestError::InvalidCallback`] when `code` is missing
    /// - [`IngestError::TokenExchange`] when the token endpoint rejects the code
    pub async fn complete_login(
        &self,
        callback_url: &Url,
        pending: Option<&AuthorizationState>,
    ) -> Result<BearerToken> {
        let params: HashMap<String, String> = callback_url.query_pairs().into_owned().collect();

        if let Some(error) = params.get("error") {
            let description = params
                .get("error_description")
                .cloned()
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::warn!(error = %error, description = %description, "Authorization denied by Ingest");
            return Err(IngestError::AuthorizationDenied {
                error: error.clone(),
                description,
            });
        }

        let received_state = params.get("state").ok_or(IngestError::StateMismatch)?;
        let pending = pending.ok_or(IngestError::StateMismatch)?;
        if !pending.matches(received_state) {
            tracing::warn!("OAuth state mismatch");
            return Err(IngestError::StateMismatch);
        }

        let code = params
            .get("code")
            .ok_or_else(|| IngestError::InvalidCallback("missing code".into()))?;

        self.exchange_code(code).await
    }

    async fn exchange_code(&self, code: &str) -> Result<BearerToken> {
        let form_params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.credential.client_id.as_str()),
            ("client_secret", self.config.credential.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&form_params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "Token exchange failed");
            return Err(IngestError::TokenExchange {
                status: status.as_u16(),
            });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Decode(e.to_string()))?;

        let token = BearerToken::from_response(token_response).ok_or(IngestError::TokenExchange {
            status: status.as_u16(),
        })?;

        tracing::info!("Ingest authorization completed");
        Ok(token)
    }

    /// Revoke the session token and clear the session.
    ///
    /// The session is only cleared once the provider confirms the revoke. On
    /// failure it is left exactly as it was, still logged in.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Revocation`] on a non-success status and
    /// [`IngestError::Transport`] on network failure.
    pub async fn logout(&self, session: &mut UserSession) -> Result<()> {
        let Some(token) = session.token.clone() else {
            session.clear();
            return Ok(());
        };

        let client = AuthenticatedClient::new(self.http.clone(), &self.config.media_type, token)?;
        let response = client
            .send(Method::DELETE, &self.config.api_endpoint(REVOKE_PATH), &[])
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Token revocation failed, session kept");
            return Err(IngestError::Revocation {
                status: status.as_u16(),
            });
        }

        session.clear();
        tracing::info!("Ingest token revoked, session cleared");
        Ok(())
    }
}
