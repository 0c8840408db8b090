//! Route definitions for Accounts domain API

use axum::{routing::get, Router};

use super::handlers::profile;
use super::middleware::AccountsState;

/// Create all Accounts domain API routes
pub fn routes() -> Router<AccountsState> {
    Router::new().route(
        "/v1/users/me",
        get(profile::get_profile).patch(profile::update_profile),
    )
}
