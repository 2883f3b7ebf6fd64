//! Request gate applied to every route.
//!
//! For each request the gate:
//! 1. short-circuits `OPTIONS` pre-flight requests with `200`,
//! 2. extracts an optional Bearer token and validates it,
//! 3. rejects protected paths that carry no token,
//! 4. binds the [`Principal`] and runs the downstream chain inside its scope,
//! 5. converts a panic in the downstream chain into a generic `500`.
//!
//! CORS headers are set on every response it returns, rejections included.

use crate::crypto::TokenError;
use crate::errors::AdminError;
use crate::middleware::cors::apply_cors_headers;
use crate::middleware::principal::{self, Principal};
use crate::observability::{hash_for_correlation, metrics::record_gate_decision};
use crate::services::token_validator::TokenValidator;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::instrument;

/// Prefix of the administrative surface.
pub const ADMIN_PREFIX: &str = "/admin/";

/// Login stays reachable without a token.
pub const LOGIN_PATH: &str = "/admin/login";

/// Static resources are served without a token even under the admin prefix.
pub const STATIC_RESOURCE_SUFFIXES: [&str; 8] =
    [".html", ".js", ".css", ".ico", ".png", ".jpg", ".gif", ".svg"];

/// State for the request gate.
#[derive(Debug, Clone)]
pub struct GateState {
    pub validator: Arc<TokenValidator>,
}

/// Whether a request to `path` must carry a valid token.
pub fn requires_authentication(path: &str) -> bool {
    path.starts_with(ADMIN_PREFIX)
        && path != LOGIN_PATH
        && !STATIC_RESOURCE_SUFFIXES
            .iter()
            .any(|suffix| path.ends_with(suffix))
}

/// Bearer token from the Authorization header.
///
/// `None` when the header is absent, is not valid header text, or uses
/// another scheme.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn rejection_outcome(err: &TokenError) -> &'static str {
    match err {
        TokenError::Expired => "expired",
        TokenError::Internal => "internal",
        TokenError::Malformed | TokenError::InvalidSignature | TokenError::WrongType => "invalid",
    }
}

/// Authentication and CORS gate for the whole router.
#[instrument(skip_all, name = "admin.middleware.auth", fields(method = %req.method()))]
pub async fn auth_gate(State(state): State<Arc<GateState>>, req: Request, next: Next) -> Response {
    let origin = req.headers().get(header::ORIGIN).cloned();

    let mut response = decide(&state, req, next).await;

    apply_cors_headers(response.headers_mut(), origin.as_ref());
    response
}

async fn decide(state: &GateState, mut req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        record_gate_decision("preflight");
        return StatusCode::OK.into_response();
    }

    let protected = requires_authentication(req.uri().path());

    let principal = match extract_bearer_token(req.headers()) {
        None if protected => {
            tracing::debug!(target: "admin.middleware.auth", "Missing bearer token on protected path");
            record_gate_decision("missing_credentials");
            return AdminError::MissingCredentials.into_response();
        }
        None => {
            record_gate_decision("anonymous");
            None
        }
        Some(token) => match state.validator.validate_access(token) {
            Ok(claims) => {
                record_gate_decision("authenticated");
                Some(Principal::new(claims.sub))
            }
            Err(e) => {
                tracing::debug!(target: "admin.middleware.auth", error = %e, "Token rejected");
                record_gate_decision(rejection_outcome(&e));
                return AdminError::from(e).into_response();
            }
        },
    };

    // An earlier layer may already have bound a principal for this request.
    let principal = match req.extensions().get::<Principal>() {
        Some(existing) => Some(existing.clone()),
        None => {
            if let Some(p) = &principal {
                tracing::debug!(
                    target: "admin.middleware.auth",
                    user = %hash_for_correlation(&p.username),
                    "Principal bound"
                );
                req.extensions_mut().insert(p.clone());
            }
            principal
        }
    };

    match AssertUnwindSafe(principal::scope(principal, next.run(req)))
        .catch_unwind()
        .await
    {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(target: "admin.middleware.auth", "Downstream handler panicked");
            record_gate_decision("panic");
            AdminError::Internal.into_response()
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::crypto::{sign_jwt, Claims, SigningKey};
    use crate::middleware::principal::{current_principal, CurrentPrincipal};
    use crate::services::token_service::TokenIssuer;
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Router};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        issuer: TokenIssuer,
        key: Arc<SigningKey>,
        hits: Arc<AtomicUsize>,
    }

    fn harness() -> Harness {
        let key = Arc::new(SigningKey::initialize(Some("gate-tests")).unwrap());
        let issuer = TokenIssuer::new(
            key.clone(),
            Duration::from_secs(600),
            Duration::from_secs(3600),
        );
        let gate = Arc::new(GateState {
            validator: Arc::new(TokenValidator::new(key.clone())),
        });
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let whoami = move |CurrentPrincipal(p): CurrentPrincipal| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let task_local = current_principal().map(|p| p.username);
                let extension = p.map(|p| p.username);
                assert_eq!(task_local, extension);
                extension.unwrap_or_else(|| "anonymous".to_string())
            }
        };

        let app = Router::new()
            .route("/admin/articles", get(whoami.clone()).post(whoami.clone()))
            .route("/admin/login", get(whoami.clone()))
            .route("/admin/index.html", get(whoami.clone()))
            .route("/index.html", get(whoami.clone()))
            .route("/api/articles", get(whoami))
            .route(
                "/admin/explode",
                get(|| async {
                    panic!("handler blew up") as ()
                }),
            )
            .layer(middleware::from_fn_with_state(gate, auth_gate));

        Harness {
            app,
            issuer,
            key,
            hits,
        }
    }

    fn request(method: Method, uri: &str, token: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, req: Request) -> (StatusCode, HeaderMap, String) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn expired_token(key: &SigningKey) -> String {
        let now = Utc::now().timestamp();
        sign_jwt(
            &Claims {
                sub: "admin".to_string(),
                iat: now - 600,
                exp: now - 10,
                token_type: None,
            },
            key,
        )
        .unwrap()
    }

    #[test]
    fn test_requires_authentication() {
        assert!(requires_authentication("/admin/articles"));
        assert!(requires_authentication("/admin/articles/12"));
        assert!(requires_authentication("/admin/check-auth"));
        assert!(requires_authentication("/admin/login/extra"));

        assert!(!requires_authentication("/admin/login"));
        assert!(!requires_authentication("/admin/index.html"));
        assert!(!requires_authentication("/admin/assets/app.js"));
        assert!(!requires_authentication("/admin/logo.svg"));
        assert!(!requires_authentication("/index.html"));
        assert!(!requires_authentication("/admin"));
        assert!(!requires_authentication("/api/articles"));
        assert!(!requires_authentication("/auth/refresh"));
        assert!(!requires_authentication("/"));
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic YWRtaW46YWRtaW4=".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "bearer abc".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[tokio::test]
    async fn test_preflight_short_circuits_without_delegation() {
        let h = harness();
        let mut req = request(Method::OPTIONS, "/admin/articles", Some("garbage"));
        req.headers_mut()
            .insert(header::ORIGIN, "https://blog.example.com".parse().unwrap());

        let (status, headers, body) = send(&h.app, req).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://blog.example.com"
        );
        assert_eq!(h.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_public_paths_reachable_anonymously() {
        let h = harness();

        for uri in ["/admin/login", "/index.html", "/admin/index.html", "/api/articles"] {
            let (status, headers, body) = send(&h.app, request(Method::GET, uri, None)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body, "anonymous");
            assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        }
    }

    #[tokio::test]
    async fn test_protected_path_without_token_is_forbidden() {
        let h = harness();

        let (status, headers, body) =
            send(&h.app, request(Method::GET, "/admin/articles", None)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], 403);
        assert!(json["data"].is_null());
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        assert_eq!(h.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_counts_as_missing() {
        let h = harness();
        let req = HttpRequest::builder()
            .uri("/admin/articles")
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();

        let (status, _, _) = send(&h.app, req).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_valid_token_binds_principal() {
        let h = harness();
        let token = h.issuer.issue_access_token("admin").unwrap().token;

        let (status, _, body) =
            send(&h.app, request(Method::GET, "/admin/articles", Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "admin");
        assert_eq!(h.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let h = harness();
        let token = expired_token(&h.key);

        let (status, _, body) =
            send(&h.app, request(Method::GET, "/admin/articles", Some(&token))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["message"], "Token expired, please log in again");
    }

    #[tokio::test]
    async fn test_tampered_token_is_unauthorized() {
        let h = harness();
        let token = h.issuer.issue_access_token("admin").unwrap().token;
        let (head, signature) = token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
        let tampered = format!("{head}.{flipped}{}", &signature[1..]);

        let (status, _, body) =
            send(&h.app, request(Method::GET, "/admin/articles", Some(&tampered))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["message"], "Token invalid, please log in again");
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_on_access_path() {
        let h = harness();
        let refresh = h.issuer.issue_refresh_token("admin").unwrap().token;

        let (status, _, _) =
            send(&h.app, request(Method::GET, "/admin/articles", Some(&refresh))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(h.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_even_on_public_path() {
        let h = harness();

        let (status, _, _) =
            send(&h.app, request(Method::GET, "/index.html", Some("not.a.token"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_on_public_path_binds_principal() {
        let h = harness();
        let token = h.issuer.issue_access_token("editor").unwrap().token;

        let (status, _, body) =
            send(&h.app, request(Method::GET, "/api/articles", Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "editor");
    }

    #[tokio::test]
    async fn test_existing_principal_is_kept() {
        let h = harness();
        let token = h.issuer.issue_access_token("admin").unwrap().token;
        let mut req = request(Method::GET, "/admin/articles", Some(&token));
        req.extensions_mut().insert(Principal::new("already-bound"));

        let (status, _, body) = send(&h.app, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "already-bound");
    }

    #[tokio::test]
    async fn test_downstream_panic_becomes_internal_error() {
        let h = harness();
        let token = h.issuer.issue_access_token("admin").unwrap().token;

        let (status, headers, body) =
            send(&h.app, request(Method::GET, "/admin/explode", Some(&token))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("blew up"));
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], 500);
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_some());
        assert!(current_principal().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_principals_do_not_leak_between_concurrent_requests() {
        let h = harness();
        let app = h.app.clone();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let app = app.clone();
                let user = if i % 3 == 0 {
                    None
                } else {
                    Some(format!("user-{i}"))
                };
                let token = user
                    .as_deref()
                    .map(|u| h.issuer.issue_access_token(u).unwrap().token);
                tokio::spawn(async move {
                    let (status, _, body) =
                        send(&app, request(Method::GET, "/api/articles", token.as_deref())).await;
                    (status, body, user)
                })
            })
            .collect();

        for handle in handles {
            let (status, body, user) = handle.await.unwrap();
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, user.unwrap_or_else(|| "anonymous".to_string()));
        }
    }
}
