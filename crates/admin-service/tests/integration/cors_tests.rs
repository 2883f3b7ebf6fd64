//! Integration tests for CORS headers and pre-flight handling.

use admin_test_utils::{TestAdminServer, TestTokenBuilder, TEST_ORIGIN};
use reqwest::{Method, StatusCode};

fn header<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_preflight_short_circuits_on_protected_path() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let response = server
        .client()
        .request(Method::OPTIONS, format!("{}/admin/articles", server.url()))
        .header("Origin", TEST_ORIGIN)
        .header("Access-Control-Request-Method", "DELETE")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "access-control-allow-origin"), Some(TEST_ORIGIN));
    assert_eq!(
        header(&response, "access-control-allow-methods"),
        Some("GET, POST, PUT, PATCH, DELETE, OPTIONS")
    );
    assert_eq!(header(&response, "access-control-max-age"), Some("3600"));
    assert!(response.text().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_preflight_ignores_bad_credentials() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;
    let expired = TestTokenBuilder::new().expired().build();

    let response = server
        .client()
        .request(Method::OPTIONS, format!("{}/admin/check-auth", server.url()))
        .bearer_auth(expired)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_rejections_carry_cors_headers() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/admin/articles", server.url()))
        .header("Origin", TEST_ORIGIN)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(header(&response, "access-control-allow-origin"), Some(TEST_ORIGIN));
    assert_eq!(header(&response, "access-control-allow-credentials"), Some("true"));
    assert_eq!(
        header(&response, "access-control-expose-headers"),
        Some("Authorization, X-Auth-Token")
    );

    Ok(())
}

#[tokio::test]
async fn test_wildcard_origin_without_origin_header() -> Result<(), anyhow::Error> {
    let server = TestAdminServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/health", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "access-control-allow-origin"), Some("*"));
    assert_eq!(
        header(&response, "access-control-allow-headers"),
        Some("Origin, X-Requested-With, Content-Type, Accept, Authorization, X-Auth-Token")
    );

    Ok(())
}
