//! # Admin Test Utilities
//!
//! Shared test utilities for the blog admin service.
//!
//! This crate provides:
//! - Fixed fixtures (signing secrets, administrator credentials, lifetimes)
//! - Deterministic signing keys built from those secrets
//! - `TestTokenBuilder` for signed tokens with arbitrary claims
//! - `TestAdminServer` for spawning a real server in E2E tests
//! - `TokenAssertions` for inspecting issued tokens
//!
//! ## Usage
//!
//! ```rust,ignore
//! use admin_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestAdminServer::spawn().await?;
//!
//!     let expired = TestTokenBuilder::new().for_user("admin").expired().build();
//!
//!     let tokens = server.login(TEST_ADMIN_USERNAME, TEST_ADMIN_PASSWORD).await?;
//!     tokens.token.assert_valid_jwt().assert_for_subject("admin");
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
