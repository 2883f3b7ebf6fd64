//! Deterministic signing keys for testing.
//!
//! Keys are always derived from fixed secrets, so tokens built here verify
//! against a server configured with the same secret.

use crate::fixtures::{OTHER_JWT_SECRET, TEST_JWT_SECRET};
use admin_service::crypto::{derive_key_bytes, SigningKey};
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::sync::Arc;

/// Signing key matching [`TEST_JWT_SECRET`].
pub fn test_signing_key() -> Arc<SigningKey> {
    signing_key_for(TEST_JWT_SECRET)
}

/// Signing key unrelated to the test server's.
pub fn other_signing_key() -> Arc<SigningKey> {
    signing_key_for(OTHER_JWT_SECRET)
}

/// Signing key derived from an arbitrary secret.
pub fn signing_key_for(secret: &str) -> Arc<SigningKey> {
    Arc::new(SigningKey::initialize(Some(secret)).expect("configured keys never fail"))
}

/// Raw `jsonwebtoken` encoding key for `secret`, padded the way the service
/// pads configured secrets.
pub fn encoding_key_for(secret: &str) -> EncodingKey {
    EncodingKey::from_secret(&derive_key_bytes(secret))
}

/// Raw `jsonwebtoken` decoding key for `secret`.
pub fn decoding_key_for(secret: &str) -> DecodingKey {
    DecodingKey::from_secret(&derive_key_bytes(secret))
}
