//! HTTP request handlers.

pub mod auth_handler;
pub mod health;
pub mod metrics;

pub use auth_handler::{check_auth, handle_login, handle_refresh};
pub use health::health_check;
pub use metrics::metrics_handler;
