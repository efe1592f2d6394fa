//! Routes for the user-authorization front-end.
//!
//! Each handler loads the visitor's [`UserSession`] through the private
//! session cookie, passes it explicitly to the core operation and saves it
//! back before responding.

use std::sync::Arc;

use axum::extract::{FromRef, Path, RawQuery, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use axum_extra::extract::PrivateCookieJar;

use super::views::{self, Navigation};
use crate::auth::AuthorizationCodeFlow;
use crate::error::IngestError;
use crate::gateway::{select_playback_url, VideoGateway};
use crate::session::{SessionId, SessionTokenStore, UserSession};

pub const SESSION_COOKIE_NAME: &str = "ingest_session";

#[derive(Clone)]
pub struct UserAuthState {
    flow: Arc<AuthorizationCodeFlow>,
    sessions: SessionTokenStore,
    http: reqwest::Client,
    cookie_key: Key,
}

impl UserAuthState {
    pub fn new(flow: AuthorizationCodeFlow, http: reqwest::Client, cookie_key: Key) -> Self {
        Self {
            flow: Arc::new(flow),
            sessions: SessionTokenStore::new(),
            http,
            cookie_key,
        }
    }

    pub fn sessions(&self) -> &SessionTokenStore {
        &self.sessions
    }
}

impl FromRef<UserAuthState> for Key {
    fn from_ref(state: &UserAuthState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn user_authorization_router(state: UserAuthState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login))
        .route("/oauth/callback", get(callback))
        .route("/logout", get(logout).post(logout))
        .route("/videos", get(show_videos))
        .route("/videos/:id", get(show_video))
        .with_state(state)
}

/// Session id from the cookie, minting one (and its cookie) on first visit.
fn session_context(
    jar: PrivateCookieJar,
    sessions: &SessionTokenStore,
) -> (PrivateCookieJar, SessionId, UserSession) {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        let id = SessionId(cookie.value().to_string());
        let session = sessions.load(&id);
        return (jar, id, session);
    }

    let id = SessionId::generate();
    let cookie = Cookie::build((SESSION_COOKIE_NAME, id.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    (jar.add(cookie), id, UserSession::default())
}

// ── Index ──────────────────────────────────────────────────────────

async fn index(
    State(state): State<UserAuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Html<String>) {
    let (jar, _, session) = session_context(jar, &state.sessions);
    let nav = if session.logged_in {
        Navigation::SignedIn
    } else {
        Navigation::SignedOut
    };
    (jar, views::index(nav))
}

// ── Login ──────────────────────────────────────────────────────────

async fn login(
    State(state): State<UserAuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let (jar, id, mut session) = session_context(jar, &state.sessions);

    let target = state
        .flow
        .begin_login(&mut session, &state.flow.config().scope);
    state.sessions.save(&id, session);

    (jar, Redirect::to(target.url.as_str()))
}

// ── Callback ───────────────────────────────────────────────────────

async fn callback(
    State(state): State<UserAuthState>,
    jar: PrivateCookieJar,
    RawQuery(query): RawQuery,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let (jar, id, mut session) = session_context(jar, &state.sessions);

    if !session.is_pending() {
        tracing::warn!(session_id = %id, "OAuth callback without a pending login");
    }

    // The nonce is single-use: consumed before the outcome is known.
    let pending = session.oauth_state.take();
    state.sessions.save(&id, session.clone());

    let mut callback_url = state.flow.config().redirect_uri.clone();
    callback_url.set_query(query.as_deref());

    let token = match state
        .flow
        .complete_login(&callback_url, pending.as_ref())
        .await
    {
        Ok(token) => token,
        Err(e) => return Err((jar, e).into_response()),
    };

    session.establish(token);
    state.sessions.save(&id, session);
    tracing::info!(session_id = %id, "User login successful");

    Ok((jar, Redirect::to("/")))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(
    State(state): State<UserAuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let (jar, id, mut session) = session_context(jar, &state.sessions);

    if let Err(e) = state.flow.logout(&mut session).await {
        tracing::warn!(session_id = %id, error = %e, "Logout failed, session kept");
        return Err((jar, e).into_response());
    }
    state.sessions.remove(&id);

    Ok((jar, Redirect::to("/")))
}

// ── Videos ─────────────────────────────────────────────────────────

async fn show_videos(
    State(state): State<UserAuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Html<String>), IngestError> {
    let (jar, _, session) = session_context(jar, &state.sessions);
    let gateway = VideoGateway::for_session(state.flow.config(), state.http.clone(), &session)?;

    let videos = gateway.list_videos().await?;
    Ok((jar, views::video_list(&videos)))
}

async fn show_video(
    State(state): State<UserAuthState>,
    jar: PrivateCookieJar,
    Path(id): Path<String>,
) -> Result<(PrivateCookieJar, Html<String>), IngestError> {
    let (jar, _, session) = session_context(jar, &state.sessions);
    let gateway = VideoGateway::for_session(state.flow.config(), state.http.clone(), &session)?;

    let video = gateway.get_video(&id).await?;
    let play_url = select_playback_url(&video);
    Ok((jar, views::video_page(&video, play_url)))
}
