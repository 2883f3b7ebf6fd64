//! Request-scoped identity published by the request gate.
//!
//! The gate stores the [`Principal`] in the request extensions and runs the
//! downstream chain inside a task-local scope. Handlers read it either with
//! the [`CurrentPrincipal`] extractor or with [`current_principal`] from
//! code that has no access to the request.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use std::future::Future;

/// Operator id used when the caller is anonymous or the username is not numeric.
pub const DEFAULT_OPERATOR_ID: i64 = 1;

tokio::task_local! {
    static CURRENT_PRINCIPAL: Option<Principal>;
}

/// Authenticated caller of the current request.
///
/// There is no role model; `authorities` is always empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub authorities: Vec<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            authorities: Vec::new(),
        }
    }

    /// Numeric operator id recorded against audited writes.
    pub fn operator_id(&self) -> i64 {
        self.username
            .trim()
            .parse::<i64>()
            .unwrap_or(DEFAULT_OPERATOR_ID)
    }
}

/// Operator id for an optional caller.
pub fn resolve_operator_id(principal: Option<&Principal>) -> i64 {
    principal.map_or(DEFAULT_OPERATOR_ID, Principal::operator_id)
}

/// Principal bound to the request being served by this task, if any.
///
/// Returns `None` outside a gated request and for anonymous requests.
pub fn current_principal() -> Option<Principal> {
    CURRENT_PRINCIPAL.try_with(|p| p.clone()).ok().flatten()
}

/// Run `fut` with `principal` bound. The binding is gone once `fut`
/// completes, is dropped, or unwinds.
pub(crate) async fn scope<F: Future>(principal: Option<Principal>, fut: F) -> F::Output {
    CURRENT_PRINCIPAL.scope(principal, fut).await
}

/// Extractor for the caller's identity; `None` on anonymous requests.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Option<Principal>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentPrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}
