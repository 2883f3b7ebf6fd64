//! Integration tests for `POST /admin/login`.

use admin_test_utils::{
    TestAdminServer, TokenAssertions, TEST_ACCESS_TTL_SECONDS, TEST_ADMIN_PASSWORD,
    TEST_ADMIN_USERNAME, TEST_REFRESH_TTL_SECONDS,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn post_login(server: &TestAdminServer, body: Value) -> Result<(StatusCode, Value), anyhow::Error> {
    let response = server
        .client()
        .post(format!("{}/admin/login", server.url()))
        .json(&body)
        .send()
        .await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

#[tokio::test]
async fn test_login_issues_access_and_refresh_tokens() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let tokens = server.login(TEST_ADMIN_USERNAME, TEST_ADMIN_PASSWORD).await?;

    assert_eq!(tokens.username, TEST_ADMIN_USERNAME);
    assert_eq!(tokens.token_type, "Bearer");
    assert_eq!(tokens.expires_in, TEST_ACCESS_TTL_SECONDS);

    tokens
        .token
        .assert_valid_jwt()
        .assert_for_subject(TEST_ADMIN_USERNAME)
        .assert_access_token()
        .assert_lifetime(TEST_ACCESS_TTL_SECONDS);

    tokens
        .refresh_token
        .assert_valid_jwt()
        .assert_for_subject(TEST_ADMIN_USERNAME)
        .assert_refresh_token()
        .assert_lifetime(TEST_REFRESH_TTL_SECONDS);

    Ok(())
}

#[tokio::test]
async fn test_login_response_envelope() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let (status, body) = post_login(
        &server,
        json!({"username": TEST_ADMIN_USERNAME, "password": TEST_ADMIN_PASSWORD}),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["message"], "success");
    for field in ["token", "refreshToken", "username", "tokenType", "expiresIn"] {
        assert!(!body["data"][field].is_null(), "missing {field}");
    }

    Ok(())
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let (status, body) = post_login(
        &server,
        json!({"username": TEST_ADMIN_USERNAME, "password": "not-the-password"}),
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"code": 401, "message": "Unauthorized", "data": null}));

    Ok(())
}

#[tokio::test]
async fn test_unknown_user_looks_like_wrong_password() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let (unknown_status, unknown_body) = post_login(
        &server,
        json!({"username": "nobody", "password": TEST_ADMIN_PASSWORD}),
    )
    .await?;
    let (wrong_status, wrong_body) = post_login(
        &server,
        json!({"username": TEST_ADMIN_USERNAME, "password": "nope"}),
    )
    .await?;

    assert_eq!(unknown_status, wrong_status);
    assert_eq!(unknown_body, wrong_body);

    Ok(())
}

#[tokio::test]
async fn test_login_token_opens_protected_routes() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let tokens = server.login(TEST_ADMIN_USERNAME, TEST_ADMIN_PASSWORD).await?;

    let response = server
        .client()
        .get(format!("{}/admin/check-auth", server.url()))
        .bearer_auth(&tokens.token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["principal"], TEST_ADMIN_USERNAME);

    Ok(())
}
