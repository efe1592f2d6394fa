//! Routes for the client-credentials front-end.
//!
//! Every visitor is served with the same service token. When the API rejects
//! that token the handler re-authenticates once and retries the call once.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use super::views::{self, Navigation};
use crate::auth::TokenAuthenticator;
use crate::config::ServiceCredential;
use crate::error::{IngestError, Result};
use crate::gateway::{select_playback_url, VideoGateway};

#[derive(Clone)]
pub struct ClientCredentialsState {
    gateway: Arc<VideoGateway>,
    authenticator: TokenAuthenticator,
    credential: Arc<ServiceCredential>,
}

impl ClientCredentialsState {
    pub fn new(
        gateway: VideoGateway,
        authenticator: TokenAuthenticator,
        credential: ServiceCredential,
    ) -> Self {
        Self {
            gateway: Arc::new(gateway),
            authenticator,
            credential: Arc::new(credential),
        }
    }

    async fn reauthenticate(&self) -> Result<()> {
        tracing::info!("Service token rejected, re-authenticating");
        let token = self.authenticator.authenticate(&self.credential).await?;
        self.gateway.client().replace_token(token);
        Ok(())
    }
}

pub fn client_credentials_router(state: ClientCredentialsState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/videos", get(show_videos))
        .route("/videos/:id", get(show_video))
        .with_state(state)
}

async fn index() -> Html<String> {
    views::index(Navigation::Service)
}

async fn show_videos(
    State(state): State<ClientCredentialsState>,
) -> std::result::Result<Html<String>, IngestError> {
    let videos = match state.gateway.list_videos().await {
        Err(e) if e.is_unauthorized() => {
            state.reauthenticate().await?;
            state.gateway.list_videos().await?
        }
        other => other?,
    };

    Ok(views::video_list(&videos))
}

async fn show_video(
    State(state): State<ClientCredentialsState>,
    Path(id): Path<String>,
) -> std::result::Result<Html<String>, IngestError> {
    let video = match state.gateway.get_video(&id).await {
        Err(e) if e.is_unauthorized() => {
            state.reauthenticate().await?;
            state.gateway.get_video(&id).await?
        }
        other => other?,
    };

    let play_url = select_playback_url(&video);
    Ok(views::video_page(&video, play_url))
}
