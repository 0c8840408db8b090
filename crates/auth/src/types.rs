//! Auth read-model types
//!
//! Lightweight view of the `users` rows written at signup.
//! Carries only the fields needed for authentication and role checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account type chosen at signup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Patient,
    Doctor,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountType::Patient => write!(f, "patient"),
            AccountType::Doctor => write!(f, "doctor"),
        }
    }
}

/// Identity of an authenticated user
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub account_type: AccountType,
    /// Doctors stay unverified until their license is reviewed
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl AuthIdentity {
    /// New verified patient identity
    pub fn patient(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            account_type: AccountType::Patient,
            verified: true,
            created_at: Utc::now(),
        }
    }

    /// New doctor identity with the given verification status
    pub fn doctor(id: Uuid, email: impl Into<String>, verified: bool) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            account_type: AccountType::Doctor,
            verified,
            created_at: Utc::now(),
        }
    }
}
