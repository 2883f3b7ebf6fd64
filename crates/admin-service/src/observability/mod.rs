//! Observability for the admin service.
//!
//! # Privacy by Default
//!
//! Instrumented entry points use `#[instrument(skip_all)]` and add fields
//! explicitly. Fields fall into three groups:
//! - **SAFE**: logged in plaintext (outcomes, token type labels, paths)
//! - **HASHED**: SHA-256 hashed for correlation (usernames)
//! - **NEVER**: must not appear in logs (passwords, tokens, key material)

pub mod metrics;

use crate::errors::AdminError;
use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// One-way and truncated; meant for correlating log lines about the same
/// user, not for protecting secrets.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(result.get(..4).unwrap_or_default())
}

/// Bounded error categories for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or wrong credentials.
    Authentication,
    /// Token failed verification or has expired.
    Cryptographic,
    /// Database, signing, or unexpected failures.
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Cryptographic => "cryptographic",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&AdminError> for ErrorCategory {
    fn from(err: &AdminError) -> Self {
        match err {
            AdminError::InvalidCredentials | AdminError::MissingCredentials => {
                ErrorCategory::Authentication
            }
            AdminError::ExpiredToken
            | AdminError::ExpiredRefreshToken
            | AdminError::InvalidToken(_)
            | AdminError::Crypto(_) => ErrorCategory::Cryptographic,
            AdminError::Database(_) | AdminError::Internal => ErrorCategory::Internal,
        }
    }
}
