//! Accounts domain: patient and doctor profiles

pub mod api;
pub mod domain;
pub mod repository;

pub use domain::entities::{normalize_items, Gender, ProfileChanges, UserProfile};
pub use domain::profiles::ProfileService;

#[cfg(any(test, feature = "test-support"))]
pub use repository::InMemoryProfileStore;
pub use repository::{AccountsRepositories, ProfileRepository, ProfileStore};

pub use api::routes;
pub use api::AccountsState;
