use super::storage::{FileStorage, MemoryStorage, TokenStorage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Default storage key for the bearer token
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Route the session manager navigates to on logout
pub const LOGIN_ROUTE: &str = "/login";

/// Configuration for the session manager
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the JSON storage file (`~` is expanded)
    /// Empty disables persistence and keeps the token in memory
    pub storage_path: String,

    /// Storage key holding the bearer token
    pub token_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: "~/.lingo-practice/storage.json".to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

impl SessionConfig {
    /// Open the configured storage backend
    pub fn open_storage(&self) -> Arc<dyn TokenStorage> {
        let path = self.storage_path.trim();
        if path.is_empty() {
            info!("No storage path configured, keeping the session in memory");
            return Arc::new(MemoryStorage::new());
        }

        let expanded = shellexpand::tilde(path);
        Arc::new(FileStorage::open(expanded.into_owned()))
    }
}
