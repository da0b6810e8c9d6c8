//! Observable session snapshot.

use serde::Serialize;

use super::auth::UserRecord;

/// Token and user held by the session. `token` is empty when signed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub user: Option<UserRecord>,
}

impl Session {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    /// True iff a non-empty token is held. Says nothing about server-side validity.
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}
