use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header contribution merged into outgoing requests
///
/// Empty when unauthenticated, otherwise exactly one `Authorization` entry.
pub type AuthHeader = BTreeMap<String, String>;

/// Authentication state of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// Storage has not been read yet
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(self) -> bool {
        self == AuthState::Authenticated
    }

    pub fn is_loading(self) -> bool {
        self == AuthState::Unknown
    }
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Token as currently stored, if any
    pub token: Option<String>,

    /// Whether a non-empty token was present at the last check
    pub is_authenticated: bool,

    /// Whether the initial storage read is still pending
    pub is_loading: bool,
}
