//! Generic HTTP transport: request description and bearer-aware client.

mod client;

pub use client::{ApiRequest, HttpClient, RequestBody};
