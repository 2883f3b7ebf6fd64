//! Fixed values for deterministic tests.

// Signing secrets
/// Secret the test server signs with.
pub const TEST_JWT_SECRET: &str = "test-secret-do-not-use-in-production";
/// Shorter than 32 characters; exercises key padding.
pub const TEST_SHORT_JWT_SECRET: &str = "short-secret";
/// A second, unrelated secret for cross-key tests.
pub const OTHER_JWT_SECRET: &str = "another-service-entirely-different-secret";

// Administrator credentials for the static credential store
pub const TEST_ADMIN_USERNAME: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "admin123";

// Token lifetimes (seconds)
pub const TEST_ACCESS_TTL_SECONDS: u64 = 900;
pub const TEST_REFRESH_TTL_SECONDS: u64 = 86_400;

// Browser origin used by CORS tests
pub const TEST_ORIGIN: &str = "https://blog.example.com";
