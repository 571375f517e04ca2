//! Authentication module for managing tokens and login state.
//!
//! This module provides:
//! - `TokenStore`: where the access/refresh pair is kept (memory, session file, OS keychain)
//! - `TokenService`: the store plus the refresh call against `/api/token/refresh/`
//! - `AuthSession`: login, logout and current-user lookup

pub mod credentials;
pub mod session;
pub mod store;
pub mod tokens;

pub use credentials::KeyringTokenStore;
pub use session::AuthSession;
pub use store::{open_store, FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
pub use tokens::TokenService;
