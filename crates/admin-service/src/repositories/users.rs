//! Credential lookup for the login path.
//!
//! The token subsystem never reads credentials itself; only login does, and
//! the password comparison happens there.

use crate::errors::AdminError;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

/// Stored secret for one user.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub username: String,
    pub password: SecretString,
}

/// Looks up the stored secret for a username.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when the user does not exist.
    async fn find_credential(&self, username: &str)
        -> Result<Option<StoredCredential>, AdminError>;
}

/// Single administrator account configured at startup.
#[derive(Debug, Clone)]
pub struct StaticCredentialStore {
    credential: StoredCredential,
}

impl StaticCredentialStore {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            credential: StoredCredential {
                username: username.into(),
                password,
            },
        }
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn find_credential(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredential>, AdminError> {
        if self.credential.username == username {
            Ok(Some(self.credential.clone()))
        } else {
            Ok(None)
        }
    }
}

/// Credentials from the `users` table (`username`, `password` columns).
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_credential(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredential>, AdminError> {
        let row: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT username, password
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AdminError::Database(format!("Failed to fetch user by username: {}", e)))?;

        Ok(row.map(|(username, password)| StoredCredential {
            username,
            password: SecretString::from(password),
        }))
    }
}

/// Plaintext comparison of a presented password against the stored one.
pub fn password_matches(stored: &StoredCredential, presented: &SecretString) -> bool {
    stored.password.expose_secret() == presented.expose_secret()
}
