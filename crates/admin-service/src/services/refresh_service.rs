use crate::crypto::{Claims, TokenError};
use crate::errors::AdminError;
use crate::observability::hash_for_correlation;
use crate::services::token_service::{IssuedToken, TokenIssuer};
use crate::services::token_validator::TokenValidator;
use chrono::Utc;
use thiserror::Error;

/// Why a refresh token could not be exchanged.
///
/// Kept distinct so clients can tell "log in again" (`Expired`) apart from
/// "this was never a refresh token" (`InvalidType`).
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("token is not a refresh token")]
    InvalidType,

    #[error("refresh token has expired")]
    Expired,

    #[error("refresh token is malformed or has an invalid signature")]
    Malformed,

    /// Signing the replacement access token failed.
    #[error(transparent)]
    Issue(#[from] AdminError),
}

impl From<RefreshError> for AdminError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Expired => AdminError::ExpiredRefreshToken,
            RefreshError::InvalidType | RefreshError::Malformed => {
                AdminError::InvalidToken(err.to_string())
            }
            RefreshError::Issue(inner) => inner,
        }
    }
}

/// Exchange a refresh token for a new access token.
///
/// The refresh token itself is not rotated; it stays usable until its own
/// expiry.
pub fn refresh(
    validator: &TokenValidator,
    issuer: &TokenIssuer,
    refresh_token: &str,
) -> Result<IssuedToken, RefreshError> {
    let claims = validator
        .parse_and_verify(refresh_token)
        .map_err(|e| match e {
            TokenError::Expired => RefreshError::Expired,
            _ => RefreshError::Malformed,
        })?;

    if !claims.is_refresh() {
        tracing::warn!(target: "admin.services.refresh", "Non-refresh token presented for refresh");
        return Err(RefreshError::InvalidType);
    }

    if is_past_expiry(&claims, Utc::now().timestamp()) {
        tracing::warn!(target: "admin.services.refresh", "Refresh token expired");
        return Err(RefreshError::Expired);
    }

    tracing::info!(
        target: "admin.services.refresh",
        user = %hash_for_correlation(&claims.sub),
        "Refresh token accepted"
    );

    Ok(issuer.issue_access_token(&claims.sub)?)
}

/// Expiry re-check on already verified claims; `exp == now` is expired.
fn is_past_expiry(claims: &Claims, now: i64) -> bool {
    claims.exp <= now
}
