//! Auth endpoints: login, register, whoami.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientResult;
use crate::http::{ApiRequest, HttpClient};
use crate::models::{Credentials, TokenResponse, UserRecord};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const CURRENT_USER_PATH: &str = "/auth/me";

/// Auth backend as seen by the session. Errors are returned untouched.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ClientResult<TokenResponse>;
    async fn register(&self, user_data: &Value) -> ClientResult<Value>;
    async fn current_user(&self) -> ClientResult<UserRecord>;
}

/// `AuthApi` over HTTP.
#[derive(Clone)]
pub struct HttpAuthApi {
    http: HttpClient,
}

impl HttpAuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    /// POST /auth/login (form-encoded)
    async fn login(&self, credentials: &Credentials) -> ClientResult<TokenResponse> {
        let request = ApiRequest::post(LOGIN_PATH).form([
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ]);
        let body = self.http.send(request).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// POST /auth/register
    async fn register(&self, user_data: &Value) -> ClientResult<Value> {
        self.http
            .send(ApiRequest::post(REGISTER_PATH).json(user_data.clone()))
            .await
    }

    /// GET /auth/me
    async fn current_user(&self) -> ClientResult<UserRecord> {
        self.http.send(ApiRequest::get(CURRENT_USER_PATH)).await
    }
}
