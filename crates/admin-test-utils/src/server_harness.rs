//! Test server harness for E2E testing
//!
//! Provides TestAdminServer for spawning real admin server instances in tests.

use crate::crypto_fixtures::signing_key_for;
use crate::fixtures::{
    TEST_ACCESS_TTL_SECONDS, TEST_ADMIN_PASSWORD, TEST_ADMIN_USERNAME, TEST_JWT_SECRET,
    TEST_REFRESH_TTL_SECONDS,
};
use admin_service::models::{ApiResponse, LoginResponse};
use admin_service::observability::metrics::init_metrics_recorder;
use admin_service::repositories::StaticCredentialStore;
use admin_service::routes::{self, AppState};
use admin_service::services::token_service::TokenIssuer;
use admin_service::services::token_validator::TokenValidator;
use metrics_exporter_prometheus::PrometheusBuilder;
use secrecy::SecretString;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Settings for a spawned test server.
#[derive(Debug, Clone)]
pub struct TestServerOptions {
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            access_ttl: Duration::from_secs(TEST_ACCESS_TTL_SECONDS),
            refresh_ttl: Duration::from_secs(TEST_REFRESH_TTL_SECONDS),
            admin_username: TEST_ADMIN_USERNAME.to_string(),
            admin_password: TEST_ADMIN_PASSWORD.to_string(),
        }
    }
}

/// Test harness for spawning the admin server in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_e2e() -> Result<()> {
///     let server = TestAdminServer::spawn().await?;
///     let client = reqwest::Client::new();
///
///     let response = client
///         .post(format!("{}/admin/login", server.url()))
///         .json(&serde_json::json!({"username": "admin", "password": "admin123"}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAdminServer {
    addr: SocketAddr,
    issuer: TokenIssuer,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestAdminServer {
    /// Spawn a server with the default fixtures
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawn a server with custom settings
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Sign with a key derived from `options.jwt_secret`
    /// - Authenticate logins against a static credential store
    /// - Start the HTTP server in the background
    pub async fn spawn_with(options: TestServerOptions) -> Result<Self, anyhow::Error> {
        let key = signing_key_for(&options.jwt_secret);
        let issuer = TokenIssuer::new(key.clone(), options.access_ttl, options.refresh_ttl);

        let state = Arc::new(AppState {
            issuer: issuer.clone(),
            validator: Arc::new(TokenValidator::new(key)),
            credentials: Arc::new(StaticCredentialStore::new(
                options.admin_username,
                SecretString::from(options.admin_password),
            )),
        });

        // The global recorder can only be installed once per process; later
        // servers get a standalone one.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => PrometheusBuilder::new().build_recorder().handle(),
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            issuer,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// HTTP client for talking to this server
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Issue an access token directly, bypassing login
    pub fn access_token_for(&self, username: &str) -> Result<String, anyhow::Error> {
        Ok(self.issuer.issue_access_token(username)?.token)
    }

    /// Issue a refresh token directly, bypassing login
    pub fn refresh_token_for(&self, username: &str) -> Result<String, anyhow::Error> {
        Ok(self.issuer.issue_refresh_token(username)?.token)
    }

    /// Log in through the HTTP API and return the issued tokens
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/admin/login", self.url()))
            .json(&serde_json::json!({"username": username, "password": password}))
            .send()
            .await?;

        anyhow::ensure!(
            response.status().is_success(),
            "Login failed with status {}",
            response.status()
        );

        let body: ApiResponse<LoginResponse> = response.json().await?;
        body.data
            .ok_or_else(|| anyhow::anyhow!("Login response carried no data"))
    }
}

impl Drop for TestAdminServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
