//! Custom test assertions for expressive tests
//!
//! Inspects token contents without verifying the signature; signature
//! checks belong to the service's own tests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    #[serde(default)]
    pub typ: Option<String>,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(rename = "type", default)]
    pub token_type: Option<String>,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no segment {}", index));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {}: {}", index, e))
}

fn claims_of(token: &str) -> JwtClaims {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject("admin")
///     .assert_access_token()
///     .assert_lifetime(900);
/// ```
pub trait TokenAssertions {
    /// Assert three segments, an HS256 header and decodable claims
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert that the token expires within the specified seconds (±5s)
    fn assert_expires_in(&self, seconds: u64) -> &Self;

    /// Assert `exp - iat` equals the specified seconds
    fn assert_lifetime(&self, seconds: u64) -> &Self;

    /// Assert that the token carries no `type` claim
    fn assert_access_token(&self) -> &Self;

    /// Assert that the token carries `type = "refresh"`
    fn assert_refresh_token(&self) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let count = self.split('.').count();
        assert_eq!(
            count, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            count
        );

        let header: JwtHeader =
            serde_json::from_slice(&segment(self, 0)).expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ.as_deref(), Some("JWT"), "Expected JWT type");

        claims_of(self);
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = claims_of(self);
        assert_eq!(
            claims.sub, subject,
            "Expected subject '{}', got '{}'",
            subject, claims.sub
        );
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = claims_of(self);
        let expires_in = claims.exp - chrono::Utc::now().timestamp();

        assert!(
            (expires_in - seconds as i64).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );
        self
    }

    fn assert_lifetime(&self, seconds: u64) -> &Self {
        let claims = claims_of(self);
        assert_eq!(
            claims.exp - claims.iat,
            seconds as i64,
            "Expected lifetime of {} seconds",
            seconds
        );
        self
    }

    fn assert_access_token(&self) -> &Self {
        let claims = claims_of(self);
        assert!(
            claims.token_type.is_none(),
            "Expected an access token, got type {:?}",
            claims.token_type
        );
        self
    }

    fn assert_refresh_token(&self) -> &Self {
        let claims = claims_of(self);
        assert_eq!(
            claims.token_type.as_deref(),
            Some("refresh"),
            "Expected a refresh token"
        );
        self
    }
}
