//! Durable key-value storage for the session token.

mod token_repo;

pub use token_repo::{FileRepository, KeyValueRepository, MemoryRepository, TOKEN_KEY};
