//! Integration tests for the request gate.
//!
//! Path classification, token outcomes and response bodies as seen by a real
//! HTTP client.

use admin_test_utils::{TestAdminServer, TestTokenBuilder, OTHER_JWT_SECRET};
use reqwest::StatusCode;
use serde_json::Value;

async fn get(
    server: &TestAdminServer,
    path: &str,
    token: Option<&str>,
) -> Result<(StatusCode, String), anyhow::Error> {
    let mut request = server.client().get(format!("{}{}", server.url(), path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await?;
    let status = response.status();
    Ok((status, response.text().await?))
}

#[tokio::test]
async fn test_protected_path_without_header_is_forbidden() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let (status, body) = get(&server, "/admin/articles", None).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body)?;
    assert_eq!(body["code"], 403);
    assert_eq!(body["message"], "Unauthorized access, please log in first");
    assert!(body["data"].is_null());

    Ok(())
}

#[tokio::test]
async fn test_public_paths_pass_the_gate() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    // Nothing is mounted at these paths; reaching the router's 404 proves
    // the gate let the request through.
    for path in ["/index.html", "/admin/index.html", "/admin/app.js", "/api/articles"] {
        let (status, _) = get(&server, path, None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
    }

    Ok(())
}

#[tokio::test]
async fn test_login_path_is_public() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    // GET is not routed for login; 405 means the gate did not reject it.
    let (status, _) = get(&server, "/admin/login", None).await?;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    Ok(())
}

#[tokio::test]
async fn test_expired_token_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let token = TestTokenBuilder::new().for_user("admin").expired().build();

    let (status, body) = get(&server, "/admin/articles", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body)?;
    assert_eq!(body["code"], 401);
    assert_eq!(body["message"], "Token expired, please log in again");

    Ok(())
}

#[tokio::test]
async fn test_token_from_another_key_is_invalid() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .for_user("admin")
        .signed_with(OTHER_JWT_SECRET)
        .build();

    let (status, body) = get(&server, "/admin/check-auth", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body)?;
    assert_eq!(body["message"], "Token invalid, please log in again");

    Ok(())
}

#[tokio::test]
async fn test_garbage_token_is_invalid() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let (status, _) = get(&server, "/admin/check-auth", Some("definitely-not-a-jwt")).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_empty_subject_is_invalid() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let token = TestTokenBuilder::new().for_user("").build();

    let (status, _) = get(&server, "/admin/check-auth", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_refresh_token_is_rejected_on_access_path() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let token = server.refresh_token_for("admin")?;

    let (status, _) = get(&server, "/admin/check-auth", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_valid_token_binds_principal() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let token = TestTokenBuilder::new().for_user("editor").build();

    let (status, body) = get(&server, "/admin/check-auth", Some(&token)).await?;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body)?;
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["principal"], "editor");

    Ok(())
}

#[tokio::test]
async fn test_non_bearer_scheme_counts_as_missing() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let token = server.access_token_for("admin")?;

    let response = server
        .client()
        .get(format!("{}/admin/check-auth", server.url()))
        .header("Authorization", format!("Token {token}"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    Ok(())
}
