//! Integration tests for `POST /auth/refresh`.

use admin_test_utils::{
    TestAdminServer, TestTokenBuilder, TokenAssertions, TEST_ACCESS_TTL_SECONDS,
    TEST_ADMIN_PASSWORD, TEST_ADMIN_USERNAME,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn post_refresh(
    server: &TestAdminServer,
    refresh_token: &str,
) -> Result<(StatusCode, Value), anyhow::Error> {
    let response = server
        .client()
        .post(format!("{}/auth/refresh", server.url()))
        .json(&json!({"refreshToken": refresh_token}))
        .send()
        .await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

#[tokio::test]
async fn test_refresh_mints_new_access_token() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let tokens = server.login(TEST_ADMIN_USERNAME, TEST_ADMIN_PASSWORD).await?;

    let (status, body) = post_refresh(&server, &tokens.refresh_token).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tokenType"], "Bearer");
    assert_eq!(body["data"]["expiresIn"], TEST_ACCESS_TTL_SECONDS);

    let new_token = body["data"]["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("no token in refresh response"))?
        .to_string();
    new_token
        .assert_valid_jwt()
        .assert_for_subject(TEST_ADMIN_USERNAME)
        .assert_access_token();

    let response = server
        .client()
        .get(format!("{}/admin/check-auth", server.url()))
        .bearer_auth(&new_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_refresh_token_is_reusable() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let refresh_token = server.refresh_token_for("admin")?;

    let (first, _) = post_refresh(&server, &refresh_token).await?;
    let (second, _) = post_refresh(&server, &refresh_token).await?;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_access_token_cannot_refresh() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let access = server.access_token_for("admin")?;

    let (status, body) = post_refresh(&server, &access).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token invalid, please log in again");

    Ok(())
}

#[tokio::test]
async fn test_expired_refresh_token_asks_for_login() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let expired = TestTokenBuilder::new()
        .for_user("admin")
        .refresh()
        .expired()
        .build();

    let (status, body) = post_refresh(&server, &expired).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Refresh token expired, please log in again");

    Ok(())
}

#[tokio::test]
async fn test_malformed_refresh_token() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let (status, body) = post_refresh(&server, "garbage").await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    Ok(())
}
