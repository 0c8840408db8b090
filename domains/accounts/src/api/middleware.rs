//! Accounts domain state and auth backend integration

use axum::extract::FromRef;
use std::sync::Arc;
use telecare_auth::AuthBackend;

use crate::domain::profiles::ProfileService;
use crate::repository::ProfileStore;

/// Application state for the Accounts domain
#[derive(Clone)]
pub struct AccountsState {
    pub profiles: Arc<dyn ProfileStore>,
    pub auth: AuthBackend,
}

impl AccountsState {
    pub fn new(profiles: Arc<dyn ProfileStore>, auth: AuthBackend) -> Self {
        Self { profiles, auth }
    }

    pub fn profile_service(&self) -> ProfileService {
        ProfileService::new(self.profiles.clone())
    }
}

impl FromRef<AccountsState> for AuthBackend {
    fn from_ref(state: &AccountsState) -> Self {
        state.auth.clone()
    }
}
