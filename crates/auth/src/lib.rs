//! Authentication middleware for the Telecare API
//!
//! Validates identity-provider JWTs, resolves the caller against the user
//! directory (patient or doctor account), and provides axum extractors that
//! work with any domain state implementing `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub use backend::InMemoryUserDirectory;
pub use backend::{AuthBackend, PgUserDirectory, UserDirectory};
pub use claims::IdentityClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::{AuthUser, DoctorUser, PatientUser};
#[cfg(any(test, feature = "test-support"))]
pub use jwt::issue_token;
pub use types::{AccountType, AuthIdentity};
