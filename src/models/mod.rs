//! Data models for auth requests/results and session state.

pub mod auth;
pub mod session;

pub use auth::*;
pub use session::*;
