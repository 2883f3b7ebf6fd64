//! Builder patterns for test data construction
//!
//! Provides a fluent API for signed tokens with arbitrary claims, including
//! ones the service itself would never issue (expired, empty subject, wrong
//! secret).

use crate::crypto_fixtures::encoding_key_for;
use crate::fixtures::TEST_JWT_SECRET;
use admin_service::crypto::REFRESH_TOKEN_TYPE;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::{json, Value};

/// Builder for signed test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .refresh()
///     .expires_in(-60)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    iat: i64,
    exp: i64,
    token_type: Option<String>,
    secret: String,
}

impl TestTokenBuilder {
    /// Access token for `test-subject`, valid for an hour, signed with
    /// [`TEST_JWT_SECRET`].
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            token_type: None,
            secret: TEST_JWT_SECRET.to_string(),
        }
    }

    /// Set the subject (username)
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set expiration in seconds from now; negative values are in the past
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Expired one minute ago
    pub fn expired(self) -> Self {
        self.issued_at((Utc::now() - Duration::seconds(3600)).timestamp())
            .expires_in(-60)
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Mark as a refresh token
    pub fn refresh(self) -> Self {
        self.with_type(REFRESH_TOKEN_TYPE)
    }

    /// Set an arbitrary `type` claim
    pub fn with_type(mut self, token_type: &str) -> Self {
        self.token_type = Some(token_type.to_string());
        self
    }

    /// Sign with another secret
    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// The claims as a JSON value
    pub fn claims(&self) -> Value {
        let mut claims = json!({
            "sub": self.sub,
            "iat": self.iat,
            "exp": self.exp,
        });
        if let (Some(token_type), Some(map)) = (&self.token_type, claims.as_object_mut()) {
            map.insert("type".to_string(), json!(token_type));
        }
        claims
    }

    /// Sign and encode the token (HS256)
    pub fn build(self) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &self.claims(),
            &encoding_key_for(&self.secret),
        )
        .expect("HS256 signing of JSON claims cannot fail")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
