use super::claims::redact;
use super::config::{DEFAULT_TOKEN_KEY, LOGIN_ROUTE};
use super::navigator::Navigator;
use super::state::{AuthHeader, AuthState, SessionSnapshot};
use super::storage::{StorageError, TokenStorage};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("refusing to store an empty token")]
    EmptyToken,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Single source of truth for "is this client authenticated"
///
/// Backed by a [`TokenStorage`]; every operation degrades to the logged-out
/// state instead of failing. Share it behind an `Arc`.
pub struct SessionManager {
    storage: Arc<dyn TokenStorage>,
    navigator: Arc<dyn Navigator>,
    token_key: String,
    state: RwLock<AuthState>,
}

impl SessionManager {
    /// Create a manager in the `Unknown` state; call [`check_auth`](Self::check_auth) next
    pub fn new(storage: Arc<dyn TokenStorage>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_token_key(storage, navigator, DEFAULT_TOKEN_KEY)
    }

    pub fn with_token_key(
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
        token_key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            navigator,
            token_key: token_key.into(),
            state: RwLock::new(AuthState::Unknown),
        }
    }

    /// Read the stored token and resolve the authentication state
    pub fn check_auth(&self) -> AuthState {
        let state = match self.stored_token() {
            Some(_) => AuthState::Authenticated,
            None => AuthState::Unauthenticated,
        };
        self.set_state(state);

        info!(
            "Auth check complete ({} storage): {:?}",
            self.storage.name(),
            state
        );
        state
    }

    /// Store `token` and mark the session authenticated
    ///
    /// Storage failures are logged and swallowed; the state is left as it was.
    /// Use [`try_login`](Self::try_login) to observe the failure.
    pub fn login(&self, token: &str) {
        if let Err(e) = self.try_login(token) {
            error!("Failed to save token: {}", e);
        }
    }

    /// Like [`login`](Self::login) but reports why the token was not stored
    pub fn try_login(&self, token: &str) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }

        self.storage.set_item(&self.token_key, token)?;
        self.set_state(AuthState::Authenticated);

        info!("Logged in with token {}", redact(token));
        Ok(())
    }

    /// Clear the token and navigate to the login view
    ///
    /// Safe to call repeatedly; when already logged out only the navigation
    /// happens.
    pub fn logout(&self) {
        if let Err(e) = self.storage.remove_item(&self.token_key) {
            warn!("Failed to remove token during logout: {}", e);
        }

        let previous = self.set_state(AuthState::Unauthenticated);
        if previous == AuthState::Authenticated {
            info!("Logged out");
        } else {
            debug!("Logout while {:?}", previous);
        }

        self.navigator.navigate(LOGIN_ROUTE);
    }

    /// A caller observed a 401 from the API; the token is no longer valid
    pub fn handle_unauthorized(&self) {
        warn!("Server rejected the stored token, logging out");
        self.logout();
    }

    /// Header contribution for an outgoing request
    ///
    /// Re-reads storage on every call and never fails: no token, or a storage
    /// failure, yields an empty mapping.
    pub fn auth_header(&self) -> AuthHeader {
        let mut header = AuthHeader::new();
        match self.stored_token() {
            Some(token) => {
                header.insert("Authorization".to_string(), format!("Bearer {}", token));
                debug!("Generated auth header for token {}", redact(&token));
            }
            None => debug!("No token found, sending request without credentials"),
        }
        header
    }

    /// The stored token, if non-empty
    pub fn bearer_token(&self) -> Option<String> {
        self.stored_token()
    }

    pub fn state(&self) -> AuthState {
        self.state.read().map(|s| *s).unwrap_or(AuthState::Unauthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            token: self.stored_token(),
            is_authenticated: state.is_authenticated(),
            is_loading: state.is_loading(),
        }
    }

    fn stored_token(&self) -> Option<String> {
        match self.storage.get_item(&self.token_key) {
            Ok(Some(token)) if !token.trim().is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!("Token storage read failed, treating as logged out: {}", e);
                None
            }
        }
    }

    /// Returns the previous state
    fn set_state(&self, next: AuthState) -> AuthState {
        match self.state.write() {
            Ok(mut state) => std::mem::replace(&mut *state, next),
            Err(poisoned) => {
                let mut state = poisoned.into_inner();
                std::mem::replace(&mut *state, next)
            }
        }
    }
}
