pub mod users;

pub use users::{CredentialStore, PgCredentialStore, StaticCredentialStore, StoredCredential};
