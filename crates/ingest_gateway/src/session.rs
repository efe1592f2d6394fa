//! Per-user session state for the authorization-code variant.
//!
//! Sessions are values: handlers load one from the [`SessionTokenStore`],
//! hand it to core operations as `&mut UserSession`, and save it back.

use std::sync::Arc;

use dashmap::DashMap;

use crate::auth::{AuthorizationState, BearerToken};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    pub logged_in: bool,
    pub token: Option<BearerToken>,
    pub oauth_state: Option<AuthorizationState>,
}

impl UserSession {
    /// Token usable for API calls: present and the session is logged in.
    pub fn active_token(&self) -> Option<&BearerToken> {
        if self.logged_in {
            self.token.as_ref()
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.oauth_state.is_some()
    }

    /// Record a completed login.
    pub fn establish(&mut self, token: BearerToken) {
        self.token = Some(token);
        self.logged_in = true;
        self.oauth_state = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Opaque identifier carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-process session storage. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct SessionTokenStore {
    sessions: Arc<DashMap<SessionId, UserSession>>,
}

impl SessionTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `id`, or an empty one when unknown.
    pub fn load(&self, id: &SessionId) -> UserSession {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Store `session` under `id`. An empty session is forgotten instead, so
    /// visitors with nothing to remember never occupy the map.
    pub fn save(&self, id: &SessionId, session: UserSession) {
        if session == UserSession::default() {
            self.sessions.remove(id);
        } else {
            self.sessions.insert(id.clone(), session);
        }
    }

    pub fn remove(&self, id: &SessionId) -> Option<UserSession> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
