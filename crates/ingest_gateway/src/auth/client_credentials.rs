use url::Url;

use super::token::{BearerToken, TokenResponse};
use crate::config::{IngestConfig, ServiceCredential};
use crate::error::{IngestError, Result};

/// Obtains service-level bearer tokens with the client-credentials grant.
#[derive(Clone)]
pub struct TokenAuthenticator {
    http: reqwest::Client,
    token_url: Url,
    scope: String,
}

impl TokenAuthenticator {
    pub fn new(http: reqwest::Client, token_url: Url, scope: impl Into<String>) -> Self {
        Self {
            http,
            token_url,
            scope: scope.into(),
        }
    }

    pub fn from_config(config: &IngestConfig, http: reqwest::Client) -> Self {
        Self::new(http, config.token_url.clone(), config.scope.clone())
    }

    /// Exchange service credentials for a bearer token.
    ///
    /// The grant parameters travel in the query string of the `POST`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Authentication`] when the token endpoint answers
    /// with a non-success status or without an access token, and
    /// [`IngestError::Transport`] on network failure.
    pub async fn authenticate(&self, credential: &ServiceCredential) -> Result<BearerToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                client_id = %credential.client_id,
                "Client-credentials authentication failed"
            );
            return Err(IngestError::Authentication {
                status: status.as_u16(),
            });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Decode(e.to_string()))?;

        let token = BearerToken::from_response(token_response).ok_or_else(|| {
            tracing::error!("Token endpoint returned an empty access token");
            IngestError::Authentication {
                status: status.as_u16(),
            }
        })?;

        tracing::info!(client_id = %credential.client_id, "Obtained service access token");
        Ok(token)
    }
}
