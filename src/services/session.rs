//! Session lifecycle: login, register, logout, user refresh, and bootstrap from persisted token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::auth::AuthApi;
use crate::models::{
    AuthResult, Credentials, Session, UserRecord, LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE,
};
use crate::repositories::{KeyValueRepository, TOKEN_KEY};

/// What happened to a user-info refresh. Logged by the session, never propagated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The user record was replaced.
    Updated,
    /// The response arrived after the token it was fetched for was replaced or cleared.
    Discarded,
    /// The request failed; the previous user record was kept.
    Failed,
}

/// Owns the token and current user.
///
/// Cloning yields another handle to the same session. Construct one per
/// application and hand clones to consumers.
#[derive(Clone)]
pub struct SessionService {
    api: Arc<dyn AuthApi>,
    repo: Arc<dyn KeyValueRepository>,
    state: Arc<watch::Sender<Session>>,
    /// Bumped on every token change; a refresh only lands if it is unchanged.
    generation: Arc<AtomicU64>,
}

impl SessionService {
    /// Adopt a persisted token, if any, and start refreshing its user in the background.
    ///
    /// The token is adopted before any request is made, so `is_authenticated`
    /// may be true while `user` is still `None`. The background refresh needs
    /// a Tokio runtime; without one it is skipped.
    pub fn new(api: Arc<dyn AuthApi>, repo: Arc<dyn KeyValueRepository>) -> Self {
        let token = match repo.get(TOKEN_KEY) {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not read persisted token; starting signed out");
                String::new()
            }
        };
        let (state, _rx) = watch::channel(Session::with_token(token));
        let session = Self {
            api,
            repo,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
        };

        if session.is_authenticated() {
            info!("restored persisted session");
            session.spawn_user_refresh();
        }
        session
    }

    pub fn token(&self) -> String {
        self.state.borrow().token.clone()
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Observe every change to token or user.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Resolve once a user record is present. Never resolves if every refresh fails;
    /// wrap in a timeout.
    pub async fn wait_for_user(&self) -> UserRecord {
        let mut rx = self.subscribe();
        loop {
            if let Some(user) = rx.borrow_and_update().user.clone() {
                return user;
            }
            // The sender lives as long as `self`, so `changed` cannot fail here.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Exchange credentials for a token.
    ///
    /// On success the token is stored and persisted, then the user is fetched
    /// in a detached task; this call does not wait for it.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AuthResult {
        let credentials = Credentials::new(username, password);
        let response = match self.api.login(&credentials).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "login rejected");
                return AuthResult::failed(e.detail().unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string()));
            }
        };
        if response.access_token.is_empty() {
            warn!("login response carried no access token");
            return AuthResult::failed(LOGIN_FAILED_MESSAGE);
        }

        let token = response.access_token;
        // Persist before bumping the generation: the HTTP client reads the bearer
        // from storage, so a refresh tagged with the new generation must see the new token.
        if let Err(e) = self.repo.set(TOKEN_KEY, &token) {
            warn!(error = %e, "could not persist token; session will not survive a restart");
        }
        self.state.send_modify(|session| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            session.token = token.clone();
        });
        info!("login succeeded");

        self.spawn_user_refresh();
        AuthResult::ok()
    }

    /// Forward a registration record. Does not sign the user in.
    #[instrument(skip_all)]
    pub async fn register<T: Serialize + ?Sized>(&self, user_data: &T) -> AuthResult {
        let payload = match serde_json::to_value(user_data) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "registration record could not be encoded");
                return AuthResult::failed(REGISTER_FAILED_MESSAGE);
            }
        };
        match self.api.register(&payload).await {
            Ok(_) => {
                info!("registration succeeded");
                AuthResult::ok()
            }
            Err(e) => {
                warn!(error = %e, "registration rejected");
                AuthResult::failed(e.detail().unwrap_or_else(|| REGISTER_FAILED_MESSAGE.to_string()))
            }
        }
    }

    /// Best-effort refresh of the current user.
    ///
    /// Failures keep the previous user and never touch the token. Responses
    /// that arrive after the token changed (logout or a newer login) are dropped.
    /// Concurrent refreshes for the same token: last response wins.
    #[instrument(skip(self))]
    pub async fn fetch_user_info(&self) -> RefreshOutcome {
        let issued_at = self.generation.load(Ordering::SeqCst);
        let user = match self.api.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "failed to fetch user info");
                return RefreshOutcome::Failed;
            }
        };

        let applied = self.state.send_if_modified(|session| {
            if self.generation.load(Ordering::SeqCst) != issued_at {
                return false;
            }
            session.user = Some(user);
            true
        });
        if applied {
            debug!("user info updated");
            RefreshOutcome::Updated
        } else {
            debug!("discarded user info for a replaced session");
            RefreshOutcome::Discarded
        }
    }

    /// Clear token and user and forget the persisted token. Purely local; safe to repeat.
    pub fn logout(&self) {
        // Storage first, for the same reason as in `login`.
        if let Err(e) = self.repo.remove(TOKEN_KEY) {
            warn!(error = %e, "could not remove persisted token");
        }
        self.state.send_modify(|session| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            session.token.clear();
            session.user = None;
        });
        info!("logged out");
    }

    fn spawn_user_refresh(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; skipping user refresh");
            return;
        };
        let session = self.clone();
        runtime.spawn(async move { session.fetch_user_info().await });
    }
}
