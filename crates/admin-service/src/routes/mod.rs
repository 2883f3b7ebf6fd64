//! HTTP routes for the admin service.

use crate::handlers;
use crate::middleware::{auth_gate, http_metrics_middleware, GateState};
use crate::repositories::CredentialStore;
use crate::services::token_service::TokenIssuer;
use crate::services::token_validator::TokenValidator;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub issuer: TokenIssuer,
    pub validator: Arc<TokenValidator>,
    /// Credential lookup used by login.
    pub credentials: Arc<dyn CredentialStore>,
}

/// Build the application routes.
///
/// - `/health` - Liveness probe, public
/// - `/metrics` - Prometheus metrics, public
/// - `/admin/login` - Login, public
/// - `/auth/refresh` - Refresh token exchange, public
/// - `/admin/check-auth` - Caller identity, requires a token
///
/// The request gate wraps every route, so protected paths served by
/// routers merged in later are covered too.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let gate_state = Arc::new(GateState {
        validator: state.validator.clone(),
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/admin/login", post(handlers::handle_login))
        .route("/auth/refresh", post(handlers::handle_refresh))
        .route("/admin/check-auth", get(handlers::check_auth))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    with_middleware(api_routes.merge(metrics_routes), gate_state)
}

/// Upper bound on handler run time before a 408 is returned.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Layer order (bottom-to-top execution):
// 1. TimeoutLayer - 30 second request timeout (innermost)
// 2. auth_gate - CORS, pre-flight, token check; sees timeout responses too
// 3. TraceLayer - Log request details
// 4. http_metrics_middleware - Record ALL responses (outermost)
fn with_middleware(router: Router, gate_state: Arc<GateState>) -> Router {
    router
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn_with_state(gate_state, auth_gate))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::crypto::SigningKey;
    use crate::repositories::StaticCredentialStore;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use secrecy::SecretString;
    use tower::ServiceExt;

    fn app() -> Router {
        let key = Arc::new(SigningKey::initialize(Some("router-tests")).unwrap());
        let state = Arc::new(AppState {
            issuer: TokenIssuer::new(
                key.clone(),
                Duration::from_secs(900),
                Duration::from_secs(86_400),
            ),
            validator: Arc::new(TokenValidator::new(key)),
            credentials: Arc::new(StaticCredentialStore::new(
                "admin",
                SecretString::from("admin123"),
            )),
        });
        // Not installed globally; only backs the /metrics route here.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_routes(state, handle)
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn login(app: &Router) -> serde_json::Value {
        let (status, body) = call(
            app,
            Method::POST,
            "/admin/login",
            None,
            Some(serde_json::json!({"username": "admin", "password": "admin123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"].clone()
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_login_success_envelope() {
        let app = app();
        let data = login(&app).await;

        assert_eq!(data["username"], "admin");
        assert_eq!(data["tokenType"], "Bearer");
        assert_eq!(data["expiresIn"], 900);
        assert!(data["token"].as_str().unwrap().split('.').count() == 3);
        assert!(data["refreshToken"].is_string());
    }

    #[tokio::test]
    async fn test_login_failure_is_unauthorized() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/admin/login",
            None,
            Some(serde_json::json!({"username": "admin", "password": "wrong"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
        assert_eq!(body["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_check_auth_requires_token() {
        let app = app();

        let (status, body) = call(&app, Method::GET, "/admin/check-auth", None, None).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 403);
    }

    #[tokio::test]
    async fn test_check_auth_reports_principal() {
        let app = app();
        let data = login(&app).await;
        let token = data["token"].as_str().unwrap();

        let (status, body) =
            call(&app, Method::GET, "/admin/check-auth", Some(token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["authenticated"], true);
        assert_eq!(body["data"]["principal"], "admin");
    }

    #[tokio::test]
    async fn test_refresh_flow() {
        let app = app();
        let data = login(&app).await;
        let refresh_token = data["refreshToken"].as_str().unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/refresh",
            None,
            Some(serde_json::json!({"refreshToken": refresh_token})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let new_token = body["data"]["token"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["tokenType"], "Bearer");

        let (status, _) =
            call(&app, Method::GET, "/admin/check-auth", Some(&new_token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let app = app();
        let data = login(&app).await;
        let access = data["token"].as_str().unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/refresh",
            None,
            Some(serde_json::json!({"refreshToken": access})),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token invalid, please log in again");
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_reach_protected_routes() {
        let app = app();
        let data = login(&app).await;
        let refresh_token = data["refreshToken"].as_str().unwrap();

        let (status, _) =
            call(&app, Method::GET, "/admin/check-auth", Some(refresh_token), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_admin_path_without_token_is_forbidden() {
        let app = app();

        let (status, _) = call(&app, Method::GET, "/admin/articles", None, None).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_public_path_is_not_found() {
        let app = app();

        let (status, _) = call(&app, Method::GET, "/index.html", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preflight_on_any_path() {
        let app = app();

        for uri in ["/admin/articles", "/admin/login", "/anything"] {
            let (status, _) = call(&app, Method::OPTIONS, uri, None, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_request_still_carries_cors_headers() {
        let key = Arc::new(SigningKey::initialize(Some("router-tests")).unwrap());
        let gate_state = Arc::new(GateState {
            validator: Arc::new(TokenValidator::new(key)),
        });
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(REQUEST_TIMEOUT + Duration::from_secs(1)).await;
                "late"
            }),
        );
        let app = with_middleware(slow, gate_state);

        let response = app
            .oneshot(
                Request::get("/slow")
                    .header(header::ORIGIN, "http://blog.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://blog.example"
        );
    }

    #[tokio::test]
    async fn test_health_and_metrics_are_public() {
        let app = app();

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
