//! Signing key material and the JWT encode/decode primitives built on it.
//!
//! Tokens are HS256 JWS compacts. The key is derived once at startup and is
//! immutable afterwards; callers share it behind an `Arc`.

use crate::errors::AdminError;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::instrument;

/// Minimum HMAC key length in bytes (256 bits, the HS256 block requirement).
pub const MIN_KEY_LEN_BYTES: usize = 32;

/// Minimum configured secret length in characters.
///
/// For ASCII secrets this equals [`MIN_KEY_LEN_BYTES`]; multi-byte secrets
/// yield longer keys.
pub const MIN_SECRET_CHARS: usize = 32;

/// Maximum accepted JWT size in bytes (8KB).
///
/// Checked before any base64 decoding or signature work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Value of the `type` claim carried only by refresh tokens.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// How the signing key was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Derived from the configured secret; survives restarts.
    Configured,
    /// Randomly generated; every restart invalidates outstanding tokens.
    Ephemeral,
}

/// Process-wide HMAC signing key.
///
/// Holds ready-to-use encoding and decoding keys derived from the same
/// material. The raw bytes are not retained.
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    source: KeySource,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("material", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

impl SigningKey {
    /// Build the signing key from an optional configured secret.
    ///
    /// A non-empty secret is stretched to [`MIN_SECRET_CHARS`] by repetition
    /// (see [`derive_key_bytes`]). An absent or empty secret yields a random
    /// key. The only failure is an unavailable system RNG.
    #[instrument(skip_all)]
    pub fn initialize(configured_secret: Option<&str>) -> Result<Self, AdminError> {
        match configured_secret.filter(|s| !s.is_empty()) {
            Some(secret) => {
                tracing::info!(target: "admin.crypto", "Using configured JWT signing secret");
                Ok(Self::from_bytes(&derive_key_bytes(secret), KeySource::Configured))
            }
            None => {
                tracing::warn!(
                    target: "admin.crypto",
                    "No JWT secret configured; using a random key. Issued tokens will not survive a restart"
                );
                let bytes = generate_random_bytes(MIN_KEY_LEN_BYTES)?;
                Ok(Self::from_bytes(&bytes, KeySource::Ephemeral))
            }
        }
    }

    fn from_bytes(bytes: &[u8], source: KeySource) -> Self {
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            source,
        }
    }

    pub fn source(&self) -> KeySource {
        self.source
    }
}

/// Stretch a configured secret to at least [`MIN_SECRET_CHARS`] characters.
///
/// Length is measured in characters, not bytes. Shorter secrets are repeated
/// and truncated to exactly the minimum character count before UTF-8
/// encoding, so a multi-byte character is never split. Longer secrets are
/// used unchanged.
pub fn derive_key_bytes(secret: &str) -> Vec<u8> {
    if secret.chars().count() >= MIN_SECRET_CHARS {
        return secret.as_bytes().to_vec();
    }

    secret
        .chars()
        .cycle()
        .take(MIN_SECRET_CHARS)
        .collect::<String>()
        .into_bytes()
}

/// Fill a buffer from the system CSPRNG.
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, AdminError> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|e| AdminError::Crypto(format!("Random key generation failed: {}", e)))?;
    Ok(bytes)
}

/// JWT claims.
///
/// `sub` is the username; it is redacted in Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl Claims {
    pub fn is_refresh(&self) -> bool {
        self.token_type.as_deref() == Some(REFRESH_TOKEN_TYPE)
    }
}

/// Why a token failed verification.
///
/// `Malformed`, `InvalidSignature` and `WrongType` all mean "verification
/// failed" to HTTP clients; they are kept apart for logs and metrics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token type is not accepted here")]
    WrongType,

    #[error("token verification failed unexpectedly")]
    Internal,
}

impl TokenError {
    /// Bounded label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
            TokenError::WrongType => "wrong_type",
            TokenError::Internal => "internal",
        }
    }
}

impl From<TokenError> for AdminError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AdminError::ExpiredToken,
            TokenError::Internal => AdminError::Internal,
            TokenError::Malformed | TokenError::InvalidSignature | TokenError::WrongType => {
                AdminError::InvalidToken(err.to_string())
            }
        }
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject => TokenError::Malformed,
        _ => TokenError::Internal,
    }
}

/// Sign claims with the HS256 key.
#[instrument(skip_all)]
pub fn sign_jwt(claims: &Claims, key: &SigningKey) -> Result<String, AdminError> {
    let header = Header::new(Algorithm::HS256);

    encode(&header, claims, &key.encoding)
        .map_err(|e| AdminError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Verify a token and return its claims.
///
/// Validates:
/// - size (must be <= [`MAX_JWT_SIZE_BYTES`])
/// - HS256 signature
/// - presence of `sub` and `exp`
/// - expiry: `exp <= now` is expired, with no leeway
/// - non-empty subject
///
/// The codec's own expiry error and the explicit `exp` check both end up as
/// [`TokenError::Expired`].
#[instrument(skip_all)]
pub fn verify_jwt(token: &str, key: &SigningKey) -> Result<Claims, TokenError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "admin.crypto",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(TokenError::Malformed);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(token, &key.decoding, &validation)
        .map_err(|e| {
            let err = classify(e.kind());
            tracing::debug!(target: "admin.crypto", error = %e, outcome = err.as_str(), "Token verification failed");
            err
        })?
        .claims;

    let now = chrono::Utc::now().timestamp();
    if claims.exp <= now {
        tracing::debug!(target: "admin.crypto", exp = claims.exp, now = now, "Token rejected: expired");
        return Err(TokenError::Expired);
    }

    if claims.sub.is_empty() {
        tracing::debug!(target: "admin.crypto", "Token rejected: empty subject");
        return Err(TokenError::Malformed);
    }

    Ok(claims)
}
