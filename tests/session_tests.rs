// Integration tests for the session manager
//
// These tests verify auth state resolution, the bearer header contribution,
// and graceful degradation when storage is unavailable.

use lingo_practice::session::{
    AuthState, DisabledStorage, FileStorage, MemoryStorage, RecordingNavigator, SessionError,
    SessionManager, TokenStorage, LOGIN_ROUTE,
};
use std::sync::Arc;
use tempfile::TempDir;

fn manager_with(storage: Arc<dyn TokenStorage>) -> (SessionManager, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::new());
    let manager = SessionManager::new(storage, navigator.clone());
    (manager, navigator)
}

#[test]
fn test_initial_state_is_loading() {
    let (manager, _) = manager_with(Arc::new(MemoryStorage::new()));

    assert_eq!(manager.state(), AuthState::Unknown);
    assert!(manager.is_loading());
    assert!(!manager.is_authenticated());
}

#[test]
fn test_check_auth_without_token() {
    let (manager, _) = manager_with(Arc::new(MemoryStorage::new()));

    assert_eq!(manager.check_auth(), AuthState::Unauthenticated);

    let snapshot = manager.snapshot();
    assert!(!snapshot.is_authenticated);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.token, None);
}

#[test]
fn test_check_auth_with_stored_token() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item("token", "stored-token").unwrap();
    let (manager, _) = manager_with(storage);

    assert_eq!(manager.check_auth(), AuthState::Authenticated);
    assert!(manager.is_authenticated());
    assert!(!manager.is_loading());
}

#[test]
fn test_check_auth_treats_empty_token_as_absent() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item("token", "").unwrap();
    let (manager, _) = manager_with(storage);

    assert_eq!(manager.check_auth(), AuthState::Unauthenticated);
    assert!(manager.auth_header().is_empty());
}

#[test]
fn test_login_then_header_is_bearer() {
    for token in ["abc", "eyJhbGciOiJIUzI1NiJ9.e30.sig", "token with spaces"] {
        let (manager, _) = manager_with(Arc::new(MemoryStorage::new()));
        manager.check_auth();
        manager.login(token);

        let header = manager.auth_header();
        assert_eq!(header.len(), 1);
        assert_eq!(
            header.get("Authorization").map(String::as_str),
            Some(format!("Bearer {}", token).as_str())
        );
        assert!(manager.is_authenticated());
    }
}

#[test]
fn test_logout_clears_header_from_any_state() {
    let setups: Vec<Box<dyn Fn(&SessionManager)>> = vec![
        Box::new(|_| {}),
        Box::new(|m| {
            m.check_auth();
        }),
        Box::new(|m| {
            m.check_auth();
            m.login("abc");
        }),
        Box::new(|m| {
            m.login("abc");
            m.logout();
        }),
    ];

    for setup in setups {
        let (manager, navigator) = manager_with(Arc::new(MemoryStorage::new()));
        setup(&manager);

        manager.logout();

        assert!(manager.auth_header().is_empty());
        assert!(!manager.is_authenticated());
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert_eq!(navigator.routes().last().map(String::as_str), Some(LOGIN_ROUTE));
    }
}

#[test]
fn test_logout_is_idempotent_apart_from_navigation() {
    let (manager, navigator) = manager_with(Arc::new(MemoryStorage::new()));
    manager.login("abc");

    manager.logout();
    manager.logout();

    assert!(!manager.is_authenticated());
    assert_eq!(navigator.routes(), vec![LOGIN_ROUTE, LOGIN_ROUTE]);
}

#[test]
fn test_unauthorized_response_logs_out() {
    let (manager, navigator) = manager_with(Arc::new(MemoryStorage::new()));
    manager.login("expired");

    manager.handle_unauthorized();

    assert!(!manager.is_authenticated());
    assert!(manager.bearer_token().is_none());
    assert_eq!(navigator.routes(), vec![LOGIN_ROUTE]);
}

#[test]
fn test_disabled_storage_degrades_to_logged_out() {
    let (manager, navigator) = manager_with(Arc::new(DisabledStorage));

    assert_eq!(manager.check_auth(), AuthState::Unauthenticated);
    assert!(manager.auth_header().is_empty());

    // Login swallows the write failure and leaves the state alone
    manager.login("abc");
    assert!(!manager.is_authenticated());
    assert!(matches!(
        manager.try_login("abc"),
        Err(SessionError::Storage(_))
    ));

    manager.logout();
    assert_eq!(navigator.routes(), vec![LOGIN_ROUTE]);
}

#[test]
fn test_empty_token_rejected() {
    let (manager, _) = manager_with(Arc::new(MemoryStorage::new()));
    manager.check_auth();

    assert!(matches!(manager.try_login("  "), Err(SessionError::EmptyToken)));
    assert!(!manager.is_authenticated());
}

#[test]
fn test_header_reflects_external_storage_change() {
    let storage = Arc::new(MemoryStorage::new());
    let (manager, _) = manager_with(storage.clone());
    manager.login("first");

    // Another writer (e.g. a second window) replaced the token
    storage.set_item("token", "second").unwrap();

    assert_eq!(
        manager.auth_header().get("Authorization").map(String::as_str),
        Some("Bearer second")
    );
}

#[test]
fn test_file_storage_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");

    {
        let (manager, _) = manager_with(Arc::new(FileStorage::open(&path)));
        manager.check_auth();
        manager.login("persisted");
    }

    let (manager, _) = manager_with(Arc::new(FileStorage::open(&path)));
    assert_eq!(manager.check_auth(), AuthState::Authenticated);
    assert_eq!(manager.bearer_token().as_deref(), Some("persisted"));

    manager.logout();
    let (manager, _) = manager_with(Arc::new(FileStorage::open(&path)));
    assert_eq!(manager.check_auth(), AuthState::Unauthenticated);
}

#[test]
fn test_login_recovers_from_corrupt_storage_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "not json").unwrap();

    let (manager, _) = manager_with(Arc::new(FileStorage::open(&path)));
    assert_eq!(manager.check_auth(), AuthState::Unauthenticated);

    manager.login("fresh");

    assert!(manager.is_authenticated());
    assert_eq!(manager.bearer_token().as_deref(), Some("fresh"));
}

#[test]
fn test_custom_token_key() {
    let storage = Arc::new(MemoryStorage::new());
    let manager = SessionManager::with_token_key(
        storage.clone(),
        Arc::new(RecordingNavigator::new()),
        "access_token",
    );
    manager.login("abc");

    assert_eq!(storage.get_item("access_token").unwrap().as_deref(), Some("abc"));
    assert_eq!(storage.get_item("token").unwrap(), None);
}
