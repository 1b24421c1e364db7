//! Credential management
//!
//! Resolves the active environment's credentials, validates or refreshes
//! the bearer token, and persists it through a [`TokenStore`].

mod manager;
mod store;

pub use manager::{extract_token, Authenticated, CredentialManager, LoginOutcome};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
