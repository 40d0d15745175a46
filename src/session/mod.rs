//! Client session management
//!
//! This module provides the `SessionManager` abstraction that manages:
//! - The bearer token kept in persistent client storage
//! - Authentication state (`Unknown` until the first storage read)
//! - The `Authorization` header contribution for outgoing requests
//! - Navigation to the login view on logout

mod claims;
mod config;
mod manager;
mod navigator;
mod state;
mod storage;

pub use claims::{redact, TokenClaims};
pub use config::{SessionConfig, DEFAULT_TOKEN_KEY, LOGIN_ROUTE};
pub use manager::{SessionError, SessionManager};
pub use navigator::{Navigator, RecordingNavigator};
pub use state::{AuthHeader, AuthState, SessionSnapshot};
pub use storage::{DisabledStorage, FileStorage, MemoryStorage, StorageError, TokenStorage};
