//! Authentication endpoints.

mod api;

pub use api::{AuthApi, HttpAuthApi, CURRENT_USER_PATH, LOGIN_PATH, REGISTER_PATH};
