use crate::crypto::{self, Claims, SigningKey, TokenError};
use crate::observability::{hash_for_correlation, metrics::record_token_validation};
use std::sync::Arc;

/// Verifies and decodes tokens against the process signing key.
///
/// Pure in-memory work; safe to share across any number of concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    key: Arc<SigningKey>,
}

impl TokenValidator {
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self { key }
    }

    /// Verify signature and expiry and return the claims.
    pub fn parse_and_verify(&self, token: &str) -> Result<Claims, TokenError> {
        let result = crypto::verify_jwt(token, &self.key);
        match &result {
            Ok(_) => record_token_validation("success", None),
            Err(e) => record_token_validation("error", Some(e.as_str())),
        }
        result
    }

    /// Like [`parse_and_verify`](Self::parse_and_verify) but refuses refresh
    /// tokens, which must never authenticate ordinary requests.
    pub fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.parse_and_verify(token)?;
        if claims.is_refresh() {
            tracing::debug!(
                target: "admin.services.validator",
                user = %hash_for_correlation(&claims.sub),
                "Refresh token presented on the access path"
            );
            record_token_validation("error", Some(TokenError::WrongType.as_str()));
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    /// Whether the token is unusable because of its age.
    ///
    /// Any failure while deriving the expiry counts as expired.
    pub fn is_expired(&self, token: &str) -> bool {
        match self.parse_and_verify(token) {
            Ok(claims) => claims.exp <= chrono::Utc::now().timestamp(),
            Err(_) => true,
        }
    }

    /// True only for a live access token issued to `expected_username`.
    pub fn validate_for_user(&self, token: &str, expected_username: &str) -> bool {
        match self.validate_access(token) {
            Ok(claims) if claims.sub == expected_username => true,
            Ok(claims) => {
                tracing::warn!(
                    target: "admin.services.validator",
                    token_user = %hash_for_correlation(&claims.sub),
                    expected_user = %hash_for_correlation(expected_username),
                    "Token subject does not match expected user"
                );
                false
            }
            Err(e) => {
                tracing::debug!(target: "admin.services.validator", error = %e, "Token validation failed");
                false
            }
        }
    }
}
