//! Business logic: session lifecycle.

pub mod session;

pub use session::{RefreshOutcome, SessionService};
