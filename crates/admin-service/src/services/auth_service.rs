use crate::errors::AdminError;
use crate::models::LoginResponse;
use crate::observability::hash_for_correlation;
use crate::repositories::users::{password_matches, CredentialStore};
use crate::services::token_service::TokenIssuer;
use secrecy::SecretString;
use tracing::instrument;

/// Scheme reported to clients alongside issued tokens.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Check a username/password pair and issue an access and refresh token.
///
/// Unknown users and wrong passwords produce the same
/// `AdminError::InvalidCredentials`.
#[instrument(skip_all, name = "admin.service.login")]
pub async fn login(
    store: &dyn CredentialStore,
    issuer: &TokenIssuer,
    username: &str,
    password: &SecretString,
) -> Result<LoginResponse, AdminError> {
    let user = hash_for_correlation(username);

    let Some(credential) = store.find_credential(username).await? else {
        tracing::warn!(target: "admin.services.auth", user = %user, "Login failed: unknown user");
        return Err(AdminError::InvalidCredentials);
    };

    if !password_matches(&credential, password) {
        tracing::warn!(target: "admin.services.auth", user = %user, "Login failed: wrong password");
        return Err(AdminError::InvalidCredentials);
    }

    let access = issuer.issue_access_token(&credential.username)?;
    let refresh = issuer.issue_refresh_token(&credential.username)?;

    tracing::info!(target: "admin.services.auth", user = %user, "Login succeeded");

    Ok(LoginResponse {
        token: access.token,
        refresh_token: refresh.token,
        username: credential.username,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: access.expires_in,
    })
}
