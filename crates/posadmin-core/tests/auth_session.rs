//! Integration tests for login, logout and current-user lookup

use std::sync::Arc;

use posadmin_core::auth::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
use posadmin_core::{ApiClient, ApiError, AuthSession};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(server: &MockServer, store: Arc<dyn TokenStore>) -> AuthSession {
    AuthSession::new(ApiClient::new(&server.uri(), store).unwrap())
}

fn usuario() -> serde_json::Value {
    json!({
        "id_usuario": 7,
        "nombre_usuario": "caja1",
        "email": "a@b.com",
        "tipo_usuario": "cajero",
        "persona": {"id_persona": 3, "nombre": "Luis", "apellido": "Pérez"}
    })
}

#[tokio::test]
async fn test_login_stores_both_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .and(body_json(json!({"email": "a@b.com", "password": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A", "refresh": "R"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&server, store.clone());
    assert!(!session.is_authenticated());

    session.login("  A@B.com ", "x").await.unwrap();

    assert!(session.is_authenticated());
    assert_eq!(store.access_token().as_deref(), Some("A"));
    assert_eq!(store.refresh_token().as_deref(), Some("R"));
}

#[tokio::test]
async fn test_login_rejected_does_not_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "No active account found with the given credentials"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("old", "r1")));
    let session = session(&server, store.clone());

    let err = session.login("a@b.com", "wrong").await.unwrap_err();
    match err {
        ApiError::InvalidCredentials(reason) => assert!(reason.contains("No active account")),
        other => panic!("expected InvalidCredentials, got {:?}", other),
    }
    // A failed login leaves the previous session alone
    assert_eq!(store.access_token().as_deref(), Some("old"));
}

#[tokio::test]
async fn test_login_without_refresh_token_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A"})))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = session(&server, store.clone());

    let err = session.login("a@b.com", "x").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
    assert!(!session.is_authenticated());
    assert!(store.load().is_none());
}

#[tokio::test]
async fn test_current_user_without_token_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/usuarios/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usuario()))
        .expect(0)
        .mount(&server)
        .await;

    let session = session(&server, Arc::new(MemoryTokenStore::new()));
    assert!(session.current_user().await.unwrap().is_none());
}

#[tokio::test]
async fn test_current_user_recovers_through_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/usuarios/me/"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/usuarios/me/"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usuario()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new", "refresh": "r2"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("old", "r1")));
    let session = session(&server, store.clone());

    let user = session.current_user().await.unwrap().unwrap();
    assert_eq!(user.display_name(), "Luis Pérez");
    assert!(!user.is_admin());
    // Rotated refresh token is kept
    assert_eq!(store.refresh_token().as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_current_user_clears_tokens_when_session_is_gone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/usuarios/me/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::open(dir.path()).unwrap());
    store.save(&TokenPair::new("old", "r1")).unwrap();
    let session = session(&server, store.clone());

    let err = session.current_user().await.unwrap_err();
    assert!(matches!(err, ApiError::RefreshFailed(_)));
    assert!(!session.is_authenticated());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_logout_removes_tokens() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("A", "R")));
    let session = session(&server, store.clone());

    session.logout().unwrap();
    assert!(!session.is_authenticated());
    assert!(store.load().is_none());
}
