//! Authentication and authorization
//!
//! The identity gate is consumed, not implemented: tokens are issued
//! elsewhere, this module only validates them and answers role questions.
//! The distinguished system principal is configuration-resolved and passes
//! through the same validation path as every other caller.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::ResidentId;
use domain_billing::CallerScope;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token
///
/// Used by tests and tooling; production tokens come from the identity
/// collaborator.
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if e.to_string().contains("ExpiredSignature") {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Checks if the caller has the required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

/// Checks if the caller is an admin
///
/// The configured system principal is admin by identity, not by role.
pub fn is_admin(claims: &Claims, system_subject: &str) -> bool {
    claims.roles.iter().any(|r| r == "admin") || claims.sub == system_subject
}

/// Resolves the caller's listing scope
///
/// Admins see everything; any other caller is scoped to their own records.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` when a non-admin subject is not a
/// parseable resident id.
pub fn caller_scope(claims: &Claims, system_subject: &str) -> Result<CallerScope, AuthError> {
    if is_admin(claims, system_subject) {
        return Ok(CallerScope::Admin);
    }
    claims
        .sub
        .parse::<ResidentId>()
        .map(CallerScope::Resident)
        .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token =
            create_token("user-1", vec!["resident".to_string()], SECRET, 3600).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.roles, vec!["resident"]);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token("user-1", vec![], SECRET, 3600).unwrap();
        assert!(matches!(
            validate_token(&token, "other-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_admin_role_grants_everything() {
        let claims = Claims {
            sub: "admin-1".to_string(),
            roles: vec!["admin".to_string()],
            exp: 0,
            iat: 0,
        };
        assert!(has_role(&claims, "resident"));
        assert!(is_admin(&claims, "system"));
    }

    #[test]
    fn test_system_subject_is_admin_without_role() {
        let claims = Claims {
            sub: "system".to_string(),
            roles: vec![],
            exp: 0,
            iat: 0,
        };
        assert!(is_admin(&claims, "system"));
        assert!(!is_admin(&claims, "different-system"));
    }

    #[test]
    fn test_caller_scope_for_resident() {
        let resident_id = ResidentId::new_v7();
        let claims = Claims {
            sub: resident_id.as_uuid().to_string(),
            roles: vec!["resident".to_string()],
            exp: 0,
            iat: 0,
        };
        let scope = caller_scope(&claims, "system").unwrap();
        assert_eq!(scope, CallerScope::Resident(resident_id));
    }
}
