//! Client-side networking and session layer for the bill management API.
//!
//! Wraps the auth endpoints over HTTP and keeps a session (bearer token plus
//! current user) that survives restarts through a persisted token entry.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod repositories;
pub mod services;

pub use auth::{AuthApi, HttpAuthApi};
pub use config::Config;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use models::{AuthResult, NewUser, Session};
pub use repositories::{FileRepository, KeyValueRepository, MemoryRepository};
pub use services::SessionService;

use std::sync::Arc;

/// Wire a session against the configured API, persisting the token under `config.token_dir`.
/// Used by main and by integration tests.
pub fn create_session(config: &Config) -> ClientResult<SessionService> {
    let repo: Arc<dyn KeyValueRepository> = Arc::new(FileRepository::new(config.token_dir.clone()));
    let http = HttpClient::new(config, repo.clone())?;
    let api = Arc::new(HttpAuthApi::new(http));
    Ok(SessionService::new(api, repo))
}
