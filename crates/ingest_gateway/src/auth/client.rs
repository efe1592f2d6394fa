use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};

use super::token::BearerToken;
use crate::error::{IngestError, Result};

/// HTTP client that signs every outbound Ingest API call with a bearer token.
///
/// Responses are returned whatever their status, 401 included: the client
/// never retries and never re-authenticates on its own. A caller that wants
/// to recover from a 401 obtains a new token and installs it with
/// [`replace_token`](Self::replace_token).
pub struct AuthenticatedClient {
    http: reqwest::Client,
    accept: HeaderValue,
    token: RwLock<BearerToken>,
}

impl AuthenticatedClient {
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if `media_type` is not a valid header value.
    pub fn new(http: reqwest::Client, media_type: &str, token: BearerToken) -> Result<Self> {
        let accept = HeaderValue::from_str(media_type)
            .map_err(|e| IngestError::Config(format!("media type: {e}")))?;
        Ok(Self {
            http,
            accept,
            token: RwLock::new(token),
        })
    }

    pub fn token(&self) -> BearerToken {
        self.token.read().clone()
    }

    pub fn replace_token(&self, token: BearerToken) {
        *self.token.write() = token;
    }

    /// Send a request with the bearer and `Accept` headers attached.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Response> {
        self.send_with_headers(method, url, params, HeaderMap::new())
            .await
    }

    /// Like [`send`](Self::send), taking caller headers that are discarded:
    /// the outgoing header set is exactly `Authorization` and `Accept`.
    pub async fn send_with_headers(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<Response> {
        if !headers.is_empty() {
            tracing::debug!(dropped = headers.len(), "Replacing caller-supplied headers");
        }
        let headers = self.auth_headers()?;

        let mut request = self.http.request(method.clone(), url).headers(headers);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, url, error = %e, "Ingest request failed before a response");
            IngestError::Transport(e)
        })?;

        // Returned untouched; the caller owns re-authentication.
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, url, "Ingest API rejected the bearer token");
        }

        Ok(response)
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let bearer = format!("Bearer {}", self.token.read().access_token());
        let mut authorization = HeaderValue::from_str(&bearer)
            .map_err(|_| IngestError::Config("access token is not a valid header value".into()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, self.accept.clone());
        Ok(headers)
    }
}
