//! Accounts domain entities
//!
//! Profile data kept on the `users` row next to the identity fields the
//! auth crate reads: demographics and medical lists for patients, licensing
//! details for doctors.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use telecare_auth::{AccountType, AuthIdentity};
use telecare_common::{Error, Result};
use uuid::Uuid;

/// Gender as offered at signup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Profile of a patient or doctor account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
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
    /// State the medical license was issued in
    pub license_state: Option<String>,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub medications: Option<Vec<String>>,
    pub medical_history: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub medical_license_number: Option<String>,
    pub license_state: Option<String>,
    pub specialization: Option<String>,
}

impl ProfileChanges {
    fn touches_medical_lists(&self) -> bool {
        self.medications.is_some() || self.medical_history.is_some() || self.allergies.is_some()
    }

    fn touches_license(&self) -> bool {
        self.medical_license_number.is_some()
            || self.license_state.is_some()
            || self.specialization.is_some()
    }
}

impl UserProfile {
    /// Empty profile for a freshly registered identity
    pub fn new(identity: &AuthIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            account_type: identity.account_type,
            verified: identity.verified,
            gender: None,
            date_of_birth: None,
            medications: Vec::new(),
            medical_history: Vec::new(),
            allergies: Vec::new(),
            medical_license_number: None,
            license_state: None,
            specialization: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.account_type == AccountType::Doctor
    }

    /// Apply a partial update.
    ///
    /// Medical lists belong to patients and licensing details to doctors.
    /// A doctor who changes their license number goes back to unverified.
    /// Returns whether verification was revoked.
    pub fn apply(&mut self, changes: ProfileChanges, today: NaiveDate) -> Result<bool> {
        if self.is_doctor() && changes.touches_medical_lists() {
            return Err(Error::Validation(
                "Medical lists only apply to patient accounts".to_string(),
            ));
        }
        if !self.is_doctor() && changes.touches_license() {
            return Err(Error::Validation(
                "License details only apply to doctor accounts".to_string(),
            ));
        }
        if changes.date_of_birth.is_some_and(|dob| dob > today) {
            return Err(Error::Validation(
                "Date of birth cannot be in the future".to_string(),
            ));
        }

        if let Some(name) = changes.name {
            let name = name.trim();
            self.name = (!name.is_empty()).then(|| name.to_string());
        }
        if let Some(gender) = changes.gender {
            self.gender = Some(gender);
        }
        if let Some(dob) = changes.date_of_birth {
            self.date_of_birth = Some(dob);
        }

        if let Some(items) = changes.medications {
            self.medications = normalize_items(items);
        }
        if let Some(items) = changes.medical_history {
            self.medical_history = normalize_items(items);
        }
        if let Some(items) = changes.allergies {
            self.allergies = normalize_items(items);
        }

        let mut revoked = false;
        if let Some(license) = changes.medical_license_number {
            let license = required_text("medical_license_number", &license)?;
            if self.medical_license_number.as_deref() != Some(license.as_str()) {
                revoked = self.verified;
                self.verified = false;
            }
            self.medical_license_number = Some(license);
        }
        if let Some(state) = changes.license_state {
            self.license_state = Some(required_text("license_state", &state)?);
        }
        if let Some(specialization) = changes.specialization {
            self.specialization = Some(required_text("specialization", &specialization)?);
        }

        self.updated_at = Utc::now();
        Ok(revoked)
    }
}

fn required_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{} cannot be blank", field)));
    }
    Ok(value.to_string())
}

/// Trim entries, drop blanks and repeats, keep the first-seen order
pub fn normalize_items(items: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !normalized.iter().any(|existing| existing == item) {
            normalized.push(item.to_string());
        }
    }
    normalized
}
