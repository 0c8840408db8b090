//! JWT validation and token extraction helpers

use axum::http::HeaderValue;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::claims::IdentityClaims;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Validate a JWT issued by the identity provider
pub(crate) fn validate_jwt_token(
    token: &str,
    config: &AuthConfig,
) -> Result<IdentityClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    let mut required = vec!["exp"];

    if let Some(aud) = &config.audience {
        validation.set_audience(&[aud]);
        required.push("aud");
    } else {
        validation.validate_aud = false;
    }

    // jsonwebtoken only checks `iss` when the claim is present unless it is required
    if let Some(iss) = &config.issuer {
        validation.set_issuer(&[iss]);
        required.push("iss");
    }
    validation.set_required_spec_claims(&required);

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_ref());

    let token_data = decode::<IdentityClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        AuthError::InvalidToken
    })?;

    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
pub(crate) fn extract_bearer_token(header: &HeaderValue) -> Result<String, AuthError> {
    let header_str = header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorizationFormat)?;

    header_str
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or(AuthError::InvalidAuthorizationFormat)
}

/// Sign a one-hour token for `user_id` the way the identity provider would
#[cfg(any(test, feature = "test-support"))]
pub fn issue_token(
    user_id: uuid::Uuid,
    email: &str,
    config: &AuthConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = IdentityClaims {
        sub: user_id.to_string(),
        email: Some(email.to_string()),
        iat: now,
        exp: now + 3600,
        aud: config
            .audience
            .clone()
            .unwrap_or_else(|| "authenticated".to_string()),
        role: "authenticated".to_string(),
    };

    let mut header = jsonwebtoken::Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    #[derive(serde::Serialize)]
    struct WithIssuer<'a> {
        #[serde(flatten)]
        claims: &'a IdentityClaims,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<&'a str>,
    }

    jsonwebtoken::encode(
        &header,
        &WithIssuer {
            claims: &claims,
            iss: config.issuer.as_deref(),
        },
        &jsonwebtoken::EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
}
