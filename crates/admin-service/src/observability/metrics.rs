//! Metrics definitions for the admin service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `admin_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `token_type`: access, refresh
//! - `status`: success, error
//! - `error_category`: token error labels (malformed, expired, ...)
//! - `outcome`: gate decisions
//! - `path`: normalized to a fixed set

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its handle.
///
/// Must be called once, before any metric is recorded.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed (e.g. already
/// installed in this process).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("admin_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("admin_token_issuance".to_string()),
            &[0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `admin_token_issuance_duration_seconds`, `admin_token_issuance_total`
/// Labels: `token_type`, `status`
pub fn record_token_issuance(token_type: &str, status: &str, duration: Duration) {
    histogram!("admin_token_issuance_duration_seconds", "token_type" => token_type.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("admin_token_issuance_total", "token_type" => token_type.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record token validation result
///
/// Metric: `admin_token_validations_total`
/// Labels: `status`, `error_category`
pub fn record_token_validation(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("admin_token_validations_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

// ============================================================================
// Gate Metrics
// ============================================================================

/// Record a request gate decision
///
/// Metric: `admin_gate_decisions_total`
/// Labels: `outcome` (preflight, anonymous, authenticated, missing_credentials,
/// expired, invalid, internal, panic)
pub fn record_gate_decision(outcome: &str) {
    counter!("admin_gate_decisions_total", "outcome" => outcome.to_string()).increment(1);
}

// ============================================================================
// Error Metrics
// ============================================================================

/// Record an error returned to a client
///
/// Metric: `admin_errors_total`
/// Labels: `error_category`, `status_code`
pub fn record_error(error_category: &str, status_code: u16) {
    counter!("admin_errors_total",
        "error_category" => error_category.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `admin_http_requests_total`, `admin_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
///
/// Captures framework-level responses too (404, 405, 415, JSON rejections).
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("admin_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path.clone(),
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("admin_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Collapse paths into a bounded label set.
fn normalize_path(path: &str) -> String {
    match path {
        "/" | "/health" | "/metrics" | "/admin/login" | "/admin/check-auth"
        | "/auth/refresh" => path.to_string(),
        _ if path.starts_with("/admin/") => "/admin/other".to_string(),
        _ => "/other".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These execute against the global no-op recorder; the values are not
    // inspected here.

    #[test]
    fn test_record_token_issuance() {
        record_token_issuance("access", "success", Duration::from_micros(120));
        record_token_issuance("refresh", "success", Duration::from_micros(80));
        record_token_issuance("access", "error", Duration::from_micros(10));
    }

    #[test]
    fn test_record_token_validation() {
        record_token_validation("success", None);
        record_token_validation("error", Some("expired"));
        record_token_validation("error", Some("malformed"));
    }

    #[test]
    fn test_record_gate_decision() {
        for outcome in ["preflight", "anonymous", "authenticated", "missing_credentials"] {
            record_gate_decision(outcome);
        }
    }

    #[test]
    fn test_record_error() {
        record_error("authentication", 403);
        record_error("cryptographic", 401);
        record_error("internal", 500);
    }

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, Duration::from_millis(1));
        record_http_request("POST", "/admin/login", 401, Duration::from_millis(3));
        record_http_request("GET", "/admin/articles/17", 403, Duration::from_millis(2));
    }

    #[test]
    fn test_normalize_path_known_paths() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/metrics"), "/metrics");
        assert_eq!(normalize_path("/admin/login"), "/admin/login");
        assert_eq!(normalize_path("/admin/check-auth"), "/admin/check-auth");
        assert_eq!(normalize_path("/auth/refresh"), "/auth/refresh");
    }

    #[test]
    fn test_normalize_path_unknown_paths() {
        assert_eq!(normalize_path("/admin/articles"), "/admin/other");
        assert_eq!(normalize_path("/admin/articles/42/tags"), "/admin/other");
        assert_eq!(normalize_path("/index.html"), "/other");
        assert_eq!(normalize_path("/api/articles"), "/other");
        assert_eq!(normalize_path(""), "/other");
    }
}
