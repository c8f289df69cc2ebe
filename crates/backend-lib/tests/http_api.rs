// ==========================
// crates/backend-lib/tests/http_api.rs
// ==========================
//! Drives the HTTP surface end to end through the router.
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use backend_lib::auth::hash_password;
use backend_lib::config::{ProviderSettings, Settings};
use backend_lib::directory::{MemoryDirectory, NewPrincipal, Principal, PrincipalDirectory};
use backend_lib::router::create_router;
use backend_lib::AppState;

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.providers.insert(
        "github".to_string(),
        ProviderSettings {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            callback_url: "http://localhost:3000/auth/github/callback".to_string(),
        },
    );
    settings
}

fn test_state() -> Arc<AppState<MemoryDirectory>> {
    Arc::new(AppState::new(MemoryDirectory::new(), test_settings()))
}

async fn seed_user(
    directory: &MemoryDirectory,
    username: &str,
    password: &str,
    verified: bool,
) -> Principal {
    directory
        .create_principal(NewPrincipal {
            username: Some(username.to_string()),
            password_hash: Some(hash_password(password).unwrap()),
            verified,
            initial_link: None,
        })
        .await
        .unwrap()
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    call(app, Method::POST, uri, body).await
}

#[tokio::test]
async fn test_signup_then_login_requires_verification() {
    let state = test_state();
    let app = create_router(state);

    let (status, body) = post(
        &app,
        "/signup",
        serde_json::json!({ "username": "ada", "password": "Str0ng-Passw0rd!" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["verified"], false);

    // the account exists but has not been verified yet
    let (status, body) = post(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "ada", "password": "Str0ng-Passw0rd!" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "Rejected");
    assert_eq!(body["reason"], "unverified_account");
    assert_eq!(body["notices"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_signup_rejects_weak_password() {
    let state = test_state();
    let app = create_router(state);

    let (status, _) = post(
        &app,
        "/signup",
        serde_json::json!({ "username": "ada", "password": "weak" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_token_and_me_flow() {
    let state = test_state();
    let user = seed_user(&state.directory, "ada", "Str0ng-Passw0rd!", true).await;
    let app = create_router(state);

    let (status, body) = post(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "ada", "password": "Str0ng-Passw0rd!" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "Authenticated");
    assert_eq!(body["principal"]["id"], serde_json::json!(user.id));
    let session_token = body["session_token"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/auth/token",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bearer = body["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/me")
                .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["username"], "ada");

    // garbage bearer tokens are a transport-level failure
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/me")
                .header(header::AUTHORIZATION, "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_credential_failures_share_one_reply_shape() {
    let state = test_state();
    seed_user(&state.directory, "ada", "Str0ng-Passw0rd!", true).await;
    let app = create_router(state);

    let (_, wrong_secret) = post(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "ada", "password": "wrong-secret" }),
    )
    .await;
    let (_, unknown_user) = post(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "mallory", "password": "wrong-secret" }),
    )
    .await;

    assert_eq!(wrong_secret["outcome"], "Rejected");
    assert_eq!(wrong_secret["reason"], unknown_user["reason"]);
    assert_eq!(wrong_secret["notices"], unknown_user["notices"]);
}

#[tokio::test]
async fn test_oauth_pending_link_resolved_by_existing_login() {
    let state = test_state();
    let user = seed_user(&state.directory, "vera", "Str0ng-Passw0rd!", true).await;
    let directory = state.directory.clone();
    let app = create_router(state);

    // completed handshake for a profile nobody has linked
    let (status, body) = post(
        &app,
        "/auth/oauth/complete",
        serde_json::json!({
            "provider": "github",
            "provider_id": "42",
            "profile": { "id": "42", "login": "vera-gh" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "LinkRequired");
    assert_eq!(body["provider"], "github");
    assert_eq!(body["provider_id"], "42");
    let session_token = body["session_token"].as_str().unwrap().to_string();

    // the session shows the outstanding choice
    let (status, body) = post(
        &app,
        "/auth/session",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["authenticated"].is_null());
    assert_eq!(body["pending_link"]["provider"], "github");

    // signing in as the existing account resolves the link
    let (status, body) = post(
        &app,
        "/auth/link/existing",
        serde_json::json!({
            "username": "vera",
            "password": "Str0ng-Passw0rd!",
            "session_token": session_token
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "Authenticated");
    assert_eq!(body["principal"]["identities"][0]["provider_id"], "42");

    let linked = directory
        .find_by_provider_identity("github", "42")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.id, user.id);

    // pending record is gone, session is authenticated
    let (_, body) = post(
        &app,
        "/auth/session",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert!(body["pending_link"].is_null());
    assert_eq!(body["authenticated"]["username"], "vera");
}

#[tokio::test]
async fn test_oauth_pending_link_resolved_by_new_account() {
    let state = test_state();
    let app = create_router(state);

    let (_, body) = post(
        &app,
        "/auth/oauth/complete",
        serde_json::json!({ "provider": "github", "provider_id": "99", "profile": {} }),
    )
    .await;
    assert_eq!(body["outcome"], "LinkRequired");
    let session_token = body["session_token"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/auth/link/new",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Created");
    assert_eq!(body["principal"]["username"], "github:99");
    assert_eq!(body["principal"]["verified"], true);

    // the next handshake for the pair signs straight in
    let (_, body) = post(
        &app,
        "/auth/oauth/complete",
        serde_json::json!({ "provider": "github", "provider_id": "99", "profile": {} }),
    )
    .await;
    assert_eq!(body["outcome"], "Authenticated");
}

#[tokio::test]
async fn test_link_new_without_pending_conflicts() {
    let state = test_state();
    let app = create_router(state);

    let (_, body) = post(
        &app,
        "/auth/oauth/complete",
        serde_json::json!({ "provider": "github", "provider_id": "7", "profile": {} }),
    )
    .await;
    let session_token = body["session_token"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/auth/link/abandon",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Abandoned");

    let (status, _) = post(
        &app,
        "/auth/link/new",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unconfigured_provider_rejected() {
    let state = test_state();
    let app = create_router(state);

    let (status, _) = post(
        &app,
        "/auth/oauth/complete",
        serde_json::json!({ "provider": "gitlab", "provider_id": "1", "profile": {} }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account_name_out() {
    let state = test_state();
    let app = create_router(state);

    for _ in 0..5 {
        let (status, body) = post(
            &app,
            "/auth/login",
            serde_json::json!({ "username": "mallory", "password": "guess-attempt-1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "Rejected");
    }

    let (status, _) = post(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "mallory", "password": "guess-attempt-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let state = test_state();
    seed_user(&state.directory, "ada", "Str0ng-Passw0rd!", true).await;
    let app = create_router(state);

    let (_, body) = post(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "ada", "password": "Str0ng-Passw0rd!" }),
    )
    .await;
    let session_token = body["session_token"].as_str().unwrap().to_string();

    let (status, _) = post(
        &app,
        "/auth/logout",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = post(
        &app,
        "/auth/session",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleted_principal_degrades_session_to_unauthenticated() {
    let state = test_state();
    let user = seed_user(&state.directory, "ada", "Str0ng-Passw0rd!", true).await;
    let directory = state.directory.clone();
    let app = create_router(state);

    let (_, body) = post(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "ada", "password": "Str0ng-Passw0rd!" }),
    )
    .await;
    assert_eq!(body["outcome"], "Authenticated");
    let session_token = body["session_token"].as_str().unwrap().to_string();

    directory.remove(user.id).unwrap();

    // not an error: the session just reads as signed out
    let (status, body) = post(
        &app,
        "/auth/session",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["authenticated"].is_null());

    // and no token can be minted for the vanished principal
    let (status, _) = post(
        &app,
        "/auth/token",
        serde_json::json!({ "session_token": session_token }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
