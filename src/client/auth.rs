//! Session lifecycle on top of [`ApiClient`].

use std::time::Duration;

use serde_json::json;

use crate::auth::models::{AuthPayload, AuthUser, LoginRequest, MessagePayload, SignUpRequest};
use crate::client::api::{ApiClient, ApiError};
use crate::client::session::{Session, SessionError};
use crate::client::watcher::{AuthSubscription, MIN_POLL_INTERVAL};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Substrings of a server error that mean the token itself is no good.
const INVALID_TOKEN_MARKERS: [&str; 4] = ["inválido", "invalid", "não autenticado", "unauthenticated"];

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token não encontrado")]
    MissingToken,

    #[error("resposta de autenticação sem token")]
    MissingTokenInResponse,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type AuthResult<T> = Result<T, AuthError>;

fn marks_invalid_token(message: &str) -> bool {
    let message = message.to_lowercase();
    INVALID_TOKEN_MARKERS.iter().any(|marker| message.contains(marker))
}

#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
    poll_interval: Duration,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Interval between server-side revocation checks in
    /// [`Self::on_auth_state_change`], never shorter than [`MIN_POLL_INTERVAL`].
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Session {
        self.api.session()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub async fn login(&self, credentials: &LoginRequest) -> AuthResult<AuthUser> {
        let payload: AuthPayload = self.api.post("/api/auth/login", credentials, false).await?;
        self.start_session(payload)
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> AuthResult<AuthUser> {
        let payload: AuthPayload = self.api.post("/api/auth/signup", request, false).await?;
        self.start_session(payload)
    }

    fn start_session(&self, payload: AuthPayload) -> AuthResult<AuthUser> {
        if payload.token.is_empty() {
            return Err(AuthError::MissingTokenInResponse);
        }
        self.session().sign_in(&payload.token, &payload.user)?;
        tracing::info!("signed in as {} ({})", payload.user.id, payload.user.user_type);
        Ok(payload.user)
    }

    /// Best-effort server revoke. The local token is removed whatever the
    /// server answers; a server failure is still reported.
    pub async fn logout(&self) -> AuthResult<()> {
        if !self.session().has_token() {
            self.session().sign_out()?;
            return Ok(());
        }

        let revoked = self
            .api
            .post::<MessagePayload, _>("/api/auth/logout", &json!({}), true)
            .await;
        self.session().sign_out()?;

        match revoked {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("server logout failed, local session cleared anyway: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn current_user(&self) -> AuthResult<AuthUser> {
        if !self.session().has_token() {
            return Err(AuthError::MissingToken);
        }

        match self.api.get::<AuthUser>("/api/auth/me", true).await {
            Ok(user) => Ok(user),
            Err(e) => {
                if marks_invalid_token(&e.to_string()) {
                    self.session().evict();
                }
                Err(e.into())
            }
        }
    }

    /// Notify `callback` of the current user on every session change and on
    /// every poll tick. See [`AuthSubscription`].
    pub fn on_auth_state_change<F>(&self, callback: F) -> AuthSubscription
    where
        F: FnMut(Option<AuthUser>) + Send + 'static,
    {
        AuthSubscription::spawn(self.clone(), self.poll_interval, callback)
    }
}
