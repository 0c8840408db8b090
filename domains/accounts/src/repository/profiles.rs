//! Profile repository over the `users` table

use crate::domain::entities::UserProfile;
use sqlx::PgPool;
use telecare_common::Result;
use uuid::Uuid;

pub(crate) const PROFILE_COLUMNS: &str = "id, email, name, account_type, verified, gender, \
     date_of_birth, medications, medical_history, allergies, \
     medical_license_number, license_state, specialization, created_at, updated_at";

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");
        let profile = sqlx::query_as::<_, UserProfile>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Write every editable field; identity columns are left alone
    pub async fn update(&self, profile: &UserProfile) -> Result<Option<UserProfile>> {
        let query = format!(
            "UPDATE users SET \
                 name = $2, gender = $3, date_of_birth = $4, \
                 medications = $5, medical_history = $6, allergies = $7, \
                 medical_license_number = $8, license_state = $9, specialization = $10, \
                 verified = $11, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, UserProfile>(&query)
            .bind(profile.id)
            .bind(&profile.name)
            .bind(profile.gender)
            .bind(profile.date_of_birth)
            .bind(&profile.medications)
            .bind(&profile.medical_history)
            .bind(&profile.allergies)
            .bind(&profile.medical_license_number)
            .bind(&profile.license_state)
            .bind(&profile.specialization)
            .bind(profile.verified)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }
}
