//! Reading and editing the caller's own profile

use std::sync::Arc;

use chrono::Utc;
use telecare_common::{Error, Result};
use uuid::Uuid;

use super::entities::{ProfileChanges, UserProfile};
use crate::repository::ProfileStore;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<UserProfile> {
        self.store
            .find_profile(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("Profile not found".to_string()))
    }

    /// Apply a partial update and persist it
    pub async fn update(&self, user_id: Uuid, changes: ProfileChanges) -> Result<UserProfile> {
        let mut profile = self.get(user_id).await?;
        let revoked = profile.apply(changes, Utc::now().date_naive())?;

        let saved = self.store.save_profile(&profile).await?;
        if revoked {
            tracing::info!(
                user_id = %user_id,
                "License number changed; doctor verification revoked"
            );
        }
        Ok(saved)
    }
}
