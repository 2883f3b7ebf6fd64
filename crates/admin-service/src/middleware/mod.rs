//! HTTP middleware for the admin service.
//!
//! - `auth` - Request gate (CORS, pre-flight, token check, principal binding)
//! - `cors` - CORS header set
//! - `principal` - Request-scoped caller identity
//! - `http_metrics` - HTTP request metrics

pub mod auth;
pub mod cors;
pub mod http_metrics;
pub mod principal;

pub use auth::{auth_gate, requires_authentication, GateState};
pub use http_metrics::http_metrics_middleware;
pub use principal::{current_principal, CurrentPrincipal, Principal};
