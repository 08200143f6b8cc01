// tests/auth_api.rs

mod common;

use axum::http::{self, StatusCode};
use serde_json::json;

use lostfound_server::auth::{AuthResponse, SessionUser};

use common::helpers::{create_test_app, get, register_user, send_json};

#[tokio::test]
async fn test_register_creates_account_with_display_name() {
    let (app, _state) = create_test_app();
    let auth = register_user(&app, "Alex Johnson", "Alex@Example.com", "hunter22").await;

    assert!(!auth.token.is_empty());
    assert_eq!(auth.user.email, "alex@example.com");
    assert_eq!(auth.user.display_name.as_deref(), Some("Alex Johnson"));
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let (app, _state) = create_test_app();
    register_user(&app, "Alex", "alex@example.com", "hunter22").await;

    let (status, body) = send_json(
        &app,
        http::Method::POST,
        "/auth/register",
        None,
        json!({ "name": "Other Alex", "email": "alex@example.com", "password": "hunter23" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(String::from_utf8_lossy(&body).contains("already exists"));
}

#[tokio::test]
async fn test_register_rejects_weak_password_and_bad_email() {
    let (app, _state) = create_test_app();

    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/register",
        None,
        json!({ "name": "Alex", "email": "alex@example.com", "password": "short" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/register",
        None,
        json!({ "name": "Alex", "email": "not-an-email", "password": "hunter22" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_round_trip() {
    let (app, _state) = create_test_app();
    register_user(&app, "Alex", "alex@example.com", "hunter22").await;

    let (status, body) = send_json(
        &app,
        http::Method::POST,
        "/auth/login",
        None,
        json!({ "email": "alex@example.com", "password": "hunter22" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let auth: AuthResponse = serde_json::from_slice(&body).unwrap();

    let (status, body) = get(&app, "/auth/me", Some(&auth.token)).await;
    assert_eq!(status, StatusCode::OK);
    let me: SessionUser = serde_json::from_slice(&body).unwrap();
    assert_eq!(me.id, auth.user.id);
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_unknown_email() {
    let (app, _state) = create_test_app();
    register_user(&app, "Alex", "alex@example.com", "hunter22").await;

    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/login",
        None,
        json!({ "email": "alex@example.com", "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/login",
        None,
        json!({ "email": "nobody@example.com", "password": "hunter22" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_a_live_session() {
    let (app, _state) = create_test_app();
    let (status, _) = get(&app, "/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, "/auth/me", Some("bogus-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let (app, _state) = create_test_app();
    let auth = register_user(&app, "Alex", "alex@example.com", "hunter22").await;

    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/logout",
        Some(&auth.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "/auth/me", Some(&auth.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_request_never_reveals_account_existence() {
    let (app, _state) = create_test_app();
    register_user(&app, "Alex", "alex@example.com", "hunter22").await;

    let (status_known, body_known) = send_json(
        &app,
        http::Method::POST,
        "/auth/reset-request",
        None,
        json!({ "email": "alex@example.com" }),
    )
    .await;
    let (status_unknown, body_unknown) = send_json(
        &app,
        http::Method::POST,
        "/auth/reset-request",
        None,
        json!({ "email": "nobody@example.com" }),
    )
    .await;

    assert_eq!(status_known, StatusCode::OK);
    assert_eq!(status_unknown, StatusCode::OK);
    assert_eq!(body_known, body_unknown);
}

#[tokio::test]
async fn test_reset_confirm_changes_the_password() {
    let (app, state) = create_test_app();
    let auth = register_user(&app, "Alex", "alex@example.com", "hunter22").await;

    // Token delivery is out of band; issue one directly for the test.
    let reset_token = state.sessions.issue_reset_token(auth.user.id);

    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/reset-confirm",
        None,
        json!({ "token": reset_token, "password": "betterpassword" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, new one does.
    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/login",
        None,
        json!({ "email": "alex@example.com", "password": "hunter22" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/login",
        None,
        json!({ "email": "alex@example.com", "password": "betterpassword" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Sessions opened under the old credentials were revoked.
    let (status, _) = get(&app, "/auth/me", Some(&auth.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_confirm_rejects_unknown_or_reused_tokens() {
    let (app, state) = create_test_app();
    let auth = register_user(&app, "Alex", "alex@example.com", "hunter22").await;

    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/reset-confirm",
        None,
        json!({ "token": "made-up", "password": "betterpassword" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let reset_token = state.sessions.issue_reset_token(auth.user.id);
    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/reset-confirm",
        None,
        json!({ "token": reset_token, "password": "betterpassword" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Single use: the same token cannot be replayed.
    let (status, _) = send_json(
        &app,
        http::Method::POST,
        "/auth/reset-confirm",
        None,
        json!({ "token": reset_token, "password": "anotherpassword" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
