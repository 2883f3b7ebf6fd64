//! Blog Admin Service Library
//!
//! Stateless token authentication for the blog administration backend:
//! issuing, validating and refreshing bearer tokens, and the per-request
//! gate that decides whether a request may proceed.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Signing key and JWT signing/verification
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Request gate, CORS, principal binding, HTTP metrics
//! - `models` - Request/response types
//! - `observability` - Metrics and log correlation helpers
//! - `repositories` - Credential lookup
//! - `routes` - Router and application state
//! - `services` - Token issuance, validation, refresh and login

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
