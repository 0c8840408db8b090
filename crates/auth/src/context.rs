//! Authorization context for authenticated users

use uuid::Uuid;

use crate::types::{AccountType, AuthIdentity};

/// Represents an authenticated user context
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub user: AuthIdentity,
}

impl AuthContext {
    pub fn new(user: AuthIdentity) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn is_patient(&self) -> bool {
        self.user.account_type == AccountType::Patient
    }

    pub fn is_doctor(&self) -> bool {
        self.user.account_type == AccountType::Doctor
    }

    /// Doctor whose license has been reviewed
    pub fn is_verified_doctor(&self) -> bool {
        self.is_doctor() && self.user.verified
    }
}
