//! Profile API handlers
//!
//! - GET /v1/users/me - Current user's profile
//! - PATCH /v1/users/me - Partial profile update

use axum::{extract::State, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use telecare_auth::{AccountType, AuthUser};
use telecare_common::{Result, ValidatedJson};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::middleware::AccountsState;
use crate::domain::entities::{Gender, ProfileChanges, UserProfile};

const MAX_ITEM_LENGTH: usize = 200;

/// Profile response DTO
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub account_type: AccountType,
    pub verified: bool,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub medications: Vec<String>,
    pub medical_history: Vec<String>,
    pub allergies: Vec<String>,
    pub medical_license_number: Option<String>,
    pub license_state: Option<String>,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            name: p.name,
            account_type: p.account_type,
            verified: p.verified,
            gender: p.gender,
            date_of_birth: p.date_of_birth,
            medications: p.medications,
            medical_history: p.medical_history,
            allergies: p.allergies,
            medical_license_number: p.medical_license_number,
            license_state: p.license_state,
            specialization: p.specialization,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Request for updating the caller's profile; omitted fields are unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,

    pub gender: Option<Gender>,

    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 50), custom(function = "validate_items"))]
    pub medications: Option<Vec<String>>,

    #[validate(length(max = 50), custom(function = "validate_items"))]
    pub medical_history: Option<Vec<String>>,

    #[validate(length(max = 50), custom(function = "validate_items"))]
    pub allergies: Option<Vec<String>>,

    #[validate(length(min = 1, max = 64))]
    pub medical_license_number: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub license_state: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub specialization: Option<String>,
}

/// Every list entry must fit a single chip in the profile view
fn validate_items(items: &[String]) -> std::result::Result<(), ValidationError> {
    if items.iter().any(|item| item.chars().count() > MAX_ITEM_LENGTH) {
        return Err(ValidationError::new("item_too_long"));
    }
    Ok(())
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(r: UpdateProfileRequest) -> Self {
        Self {
            name: r.name,
            gender: r.gender,
            date_of_birth: r.date_of_birth,
            medications: r.medications,
            medical_history: r.medical_history,
            allergies: r.allergies,
            medical_license_number: r.medical_license_number,
            license_state: r.license_state,
            specialization: r.specialization,
        }
    }
}

/// GET /v1/users/me
pub async fn get_profile(
    AuthUser(ctx): AuthUser,
    State(state): State<AccountsState>,
) -> Result<Json<ProfileResponse>> {
    let profile = state.profile_service().get(ctx.user_id()).await?;
    Ok(Json(profile.into()))
}

/// PATCH /v1/users/me
pub async fn update_profile(
    AuthUser(ctx): AuthUser,
    State(state): State<AccountsState>,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .profile_service()
        .update(ctx.user_id(), request.into())
        .await?;

    tracing::info!(user_id = %profile.id, "Profile updated");
    Ok(Json(profile.into()))
}
