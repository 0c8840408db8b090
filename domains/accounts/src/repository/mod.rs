//! Profile storage for the Accounts domain

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod profiles;

use sqlx::PgPool;
use telecare_common::{RepositoryError, Result};
use uuid::Uuid;

use crate::domain::entities::UserProfile;

#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryProfileStore;
pub use profiles::ProfileRepository;

/// Read and write access to user profiles
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>>;

    /// Persist the editable fields of an existing profile; `NotFound` if missing
    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile>;
}

/// Postgres-backed profile store
#[derive(Clone)]
pub struct AccountsRepositories {
    pub profiles: ProfileRepository,
}

impl AccountsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl ProfileStore for AccountsRepositories {
    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>> {
        self.profiles.find(id).await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        self.profiles
            .update(profile)
            .await?
            .ok_or_else(|| RepositoryError::NotFound.into())
    }
}
