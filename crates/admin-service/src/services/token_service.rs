use crate::crypto::{self, Claims, SigningKey, REFRESH_TOKEN_TYPE};
use crate::errors::AdminError;
use crate::observability::{hash_for_correlation, metrics::record_token_issuance};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A freshly signed token together with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Unix seconds.
    pub expires_at: i64,
    /// Lifetime in seconds at the moment of issuance.
    pub expires_in: u64,
}

/// Mints access and refresh tokens. Never touches storage.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: Arc<SigningKey>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(key: Arc<SigningKey>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            key,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Issue a short-lived access token (no `type` claim).
    pub fn issue_access_token(&self, username: &str) -> Result<IssuedToken, AdminError> {
        self.issue(username, self.access_ttl, None, "access")
    }

    /// Issue a long-lived refresh token (`type = "refresh"`).
    pub fn issue_refresh_token(&self, username: &str) -> Result<IssuedToken, AdminError> {
        self.issue(
            username,
            self.refresh_ttl,
            Some(REFRESH_TOKEN_TYPE.to_string()),
            "refresh",
        )
    }

    fn issue(
        &self,
        username: &str,
        ttl: Duration,
        token_type: Option<String>,
        label: &'static str,
    ) -> Result<IssuedToken, AdminError> {
        let start = Instant::now();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| AdminError::Crypto(format!("Token lifetime too large: {:?}", ttl)))?;

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
            token_type,
        };

        let result = crypto::sign_jwt(&claims, &self.key);
        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance(label, status, start.elapsed());

        let token = result?;
        tracing::info!(
            target: "admin.services.token",
            token_type = label,
            user = %hash_for_correlation(username),
            "Issued token"
        );

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
            expires_in: ttl.as_secs(),
        })
    }
}
