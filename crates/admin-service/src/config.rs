use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default refresh token lifetime (24 hours).
pub const DEFAULT_REFRESH_TTL_SECONDS: u64 = 86_400;

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Where login looks up stored credentials.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// `users` table in Postgres.
    Database { url: SecretString },
    /// A single administrator account taken from the environment.
    Static {
        username: String,
        password: SecretString,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Optional signing secret. Absent means an ephemeral random key.
    pub jwt_secret: Option<SecretString>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub credentials: CredentialSource,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // An empty secret is treated the same as an absent one.
        let jwt_secret = vars
            .get("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::from(s.clone()));

        let access_ttl = vars
            .get("JWT_ACCESS_TTL_SECONDS")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_ACCESS_TTL_SECONDS".to_string()))
            .and_then(|raw| parse_ttl("JWT_ACCESS_TTL_SECONDS", raw))?;

        let refresh_ttl = match vars.get("JWT_REFRESH_TTL_SECONDS") {
            Some(raw) => parse_ttl("JWT_REFRESH_TTL_SECONDS", raw)?,
            None => Duration::from_secs(DEFAULT_REFRESH_TTL_SECONDS),
        };

        let credentials = Self::credential_source(vars)?;

        Ok(Config {
            bind_address,
            jwt_secret,
            access_ttl,
            refresh_ttl,
            credentials,
        })
    }

    fn credential_source(vars: &HashMap<String, String>) -> Result<CredentialSource, ConfigError> {
        if let Some(url) = vars.get("DATABASE_URL").filter(|u| !u.is_empty()) {
            return Ok(CredentialSource::Database {
                url: SecretString::from(url.clone()),
            });
        }

        let username = vars
            .get("ADMIN_USERNAME")
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL or ADMIN_USERNAME".to_string()))?
            .clone();

        let password = vars
            .get("ADMIN_PASSWORD")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("ADMIN_PASSWORD".to_string()))?;

        Ok(CredentialSource::Static {
            username,
            password: SecretString::from(password.clone()),
        })
    }

    /// Signing secret as plain text, if configured.
    pub fn jwt_secret_str(&self) -> Option<&str> {
        self.jwt_secret.as_ref().map(|s| s.expose_secret())
    }
}

fn parse_ttl(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let seconds: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("expected whole seconds: {}", e),
    })?;

    if seconds == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(Duration::from_secs(seconds))
}
