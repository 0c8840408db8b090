//! In-memory profile store for tests

use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};

use chrono::Utc;
use telecare_common::{RepositoryError, Result};
use uuid::Uuid;

use super::ProfileStore;
use crate::domain::entities::UserProfile;

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, UserProfile>> {
        self.profiles
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, profile: UserProfile) {
        self.write().insert(profile.id, profile);
    }
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self
            .profiles
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        let mut profiles = self.write();
        let stored = profiles
            .get_mut(&profile.id)
            .ok_or(RepositoryError::NotFound)?;

        let mut updated = profile.clone();
        updated.id = stored.id;
        updated.email = stored.email.clone();
        updated.account_type = stored.account_type;
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }
}
