//! Concurrent requests against one server.
//!
//! Each request must see only its own principal, whatever the interleaving.

use admin_test_utils::{TestAdminServer, TestTokenBuilder};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_see_their_own_principal() -> Result<(), anyhow::Error> {
    let server = Arc::new(TestAdminServer::spawn().await?);

    let mut handles = Vec::new();
    for i in 0..48 {
        let server = server.clone();
        handles.push(tokio::spawn(async move {
            let username = format!("user-{i}");
            let mut request = server
                .client()
                .get(format!("{}/admin/check-auth", server.url()));
            // Every fourth request is anonymous and must be refused.
            if i % 4 != 0 {
                request = request.bearer_auth(TestTokenBuilder::new().for_user(&username).build());
            }
            let response = request.send().await?;
            let status = response.status();
            let body: Value = response.json().await?;
            Ok::<_, anyhow::Error>((i, username, status, body))
        }));
    }

    for handle in handles {
        let (i, username, status, body) = handle.await??;
        if i % 4 == 0 {
            assert_eq!(status, StatusCode::FORBIDDEN);
        } else {
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["principal"], username.as_str());
        }
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_token_validated_concurrently() -> Result<(), anyhow::Error> {
    let server = Arc::new(TestAdminServer::spawn().await?);
    let token = Arc::new(server.access_token_for("admin")?);

    let mut handles = Vec::new();
    for _ in 0..32 {
        let server = server.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            let response = server
                .client()
                .get(format!("{}/admin/check-auth", server.url()))
                .bearer_auth(token.as_str())
                .send()
                .await?;
            Ok::<_, anyhow::Error>(response.status())
        }));
    }

    for handle in handles {
        assert_eq!(handle.await??, StatusCode::OK);
    }

    Ok(())
}
