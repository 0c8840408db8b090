//! JWT claims types

use serde::{Deserialize, Serialize};

/// JWT claims issued by the identity provider
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
    pub aud: String,
    /// Provider role (always "authenticated" for signed-in users)
    pub role: String,
}
