//! Read access to Ingest videos.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::AuthenticatedClient;
use crate::config::{join_endpoint, IngestConfig};
use crate::error::{IngestError, Result};
use crate::session::UserSession;

/// Target name preferred for playback.
pub const PREFERRED_TARGET: &str = "high";

/// Statuses requested when listing videos.
pub const LISTED_STATUSES: &str = "published,scheduled";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoTarget {
    pub name: String,
    #[serde(default)]
    pub playback_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "poster")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub targets: Vec<VideoTarget>,
}

/// Playback URL of the target named `"high"`, else of the first target in
/// provider order, else `""` when the video has no targets.
pub fn select_playback_url(video: &Video) -> &str {
    video
        .targets
        .iter()
        .find(|target| target.name == PREFERRED_TARGET)
        .or_else(|| video.targets.first())
        .map(|target| target.playback_url.as_str())
        .unwrap_or("")
}

pub struct VideoGateway {
    client: AuthenticatedClient,
    api_url: Url,
}

impl VideoGateway {
    pub fn new(client: AuthenticatedClient, api_url: Url) -> Self {
        Self { client, api_url }
    }

    /// Per-call gateway signed with the session's token.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::NotAuthenticated`] when the session is not logged in.
    pub fn for_session(
        config: &IngestConfig,
        http: reqwest::Client,
        session: &UserSession,
    ) -> Result<Self> {
        let token = session
            .active_token()
            .cloned()
            .ok_or(IngestError::NotAuthenticated)?;
        if token.is_expired() {
            tracing::debug!("Session token is past its expiry, the API will decide");
        }
        let client = AuthenticatedClient::new(http, &config.media_type, token)?;
        Ok(Self::new(client, config.base_api_url.clone()))
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Published and scheduled videos.
    pub async fn list_videos(&self) -> Result<Vec<Video>> {
        self.get_json("videos", &[("status", LISTED_STATUSES)])
            .await
    }

    pub async fn get_video(&self, id: &str) -> Result<Video> {
        let path = format!("videos/{}", urlencoding::encode(id));
        self.get_json(&path, &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = join_endpoint(&self.api_url, path);
        let response = self.client.send(Method::GET, &url, params).await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), path, "Ingest API request failed");
            return Err(IngestError::Upstream {
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| IngestError::Decode(e.to_string()))
    }
}
