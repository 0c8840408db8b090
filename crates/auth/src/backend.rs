//! Concrete authentication backend
//!
//! Validates tokens with `AuthConfig` and resolves the subject through a
//! [`UserDirectory`]. Production uses the Postgres `users` read model;
//! tests swap in `InMemoryUserDirectory`.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::jwt::validate_jwt_token;
use crate::types::AuthIdentity;

/// Source of user identities for authentication
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<AuthIdentity>, AuthError>;
}

/// `users` table read model
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user(&self, id: Uuid) -> Result<Option<AuthIdentity>, AuthError> {
        sqlx::query_as::<_, AuthIdentity>(
            r#"
            SELECT id, email, name, account_type, verified, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %id, "Failed to load user");
            AuthError::UserLoadError
        })
    }
}

/// In-process directory for tests and local fixtures
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: std::sync::RwLock<std::collections::HashMap<Uuid, AuthIdentity>>,
}

#[cfg(any(test, feature = "test-support"))]
impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: AuthIdentity) {
        self.users
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user.id, user);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: Uuid) -> Result<Option<AuthIdentity>, AuthError> {
        Ok(self
            .users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned())
    }
}

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    directory: Arc<dyn UserDirectory>,
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(directory: Arc<dyn UserDirectory>, config: AuthConfig) -> Self {
        Self { directory, config }
    }

    /// Backend over the Postgres `users` table
    pub fn postgres(pool: PgPool, config: AuthConfig) -> Self {
        Self::new(Arc::new(PgUserDirectory::new(pool)), config)
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a bearer token and resolve its subject to a known user
    pub async fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = validate_jwt_token(token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;

        let user = self
            .directory
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::debug!(user_id = %user.id, account_type = %user.account_type, "Authenticated user");

        Ok(AuthContext::new(user))
    }
}
