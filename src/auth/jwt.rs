use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Admin roles for role-based access control.
///
/// `SuperAdmin` is a role like any other rather than a hardcoded identifier:
/// it carries the manage-admins permission, and the bootstrap account seeded
/// from `SUPER_ADMIN_ID` is simply the first account holding it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    SuperAdmin,
    Admin,
    Editor,
}

impl Role {
    pub fn from_str(role: &str) -> Result<Self, String> {
        match role.to_lowercase().as_str() {
            "superadmin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            _ => Err(format!("Invalid role: {}", role)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::Editor => "editor",
        }
    }

    /// Creating, deactivating and resetting other admin accounts.
    pub fn can_manage_admins(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Access to the notification inbox.
    pub fn can_view_notifications(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // Admin identifier (16-digit national ID)
    pub username: String, // Login name
    pub name: String,     // Display name
    pub role: Role,       // Admin role
    pub exp: usize,       // Expiration time
    pub iat: usize,       // Issued at
}

/// Generate a JWT token for an admin
pub fn generate_token(
    identifier: &str,
    username: &str,
    name: &str,
    role: Role,
) -> Result<String, JwtError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)?;

    let now = Utc::now();
    let expiry = now + Duration::hours(24); // 24 hour expiration

    let claims = Claims {
        sub: identifier.to_string(),
        username: username.to_string(),
        name: name.to_string(),
        role,
        exp: expiry.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|_| JwtError::TokenCreation)
}

/// Validate a JWT token and extract claims
pub fn validate_token(token: &str) -> Result<Claims, JwtError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)?;

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_e| JwtError::InvalidToken)?;

    Ok(token_data.claims)
}

#[derive(Debug)]
pub enum JwtError {
    MissingSecret,
    TokenCreation,
    InvalidToken,
}

impl fmt::Display for JwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtError::MissingSecret => write!(f, "JWT secret is missing or not set"),
            JwtError::TokenCreation => write!(f, "Failed to create JWT token"),
            JwtError::InvalidToken => write!(f, "Invalid or expired JWT token"),
        }
    }
}

impl From<JwtError> for StatusCode {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const TEST_ID: &str = "1308162101990001";

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("superadmin").unwrap(), Role::SuperAdmin);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("editor").unwrap(), Role::Editor);
        assert!(Role::from_str("analyst").is_err());
    }

    #[test]
    fn test_role_case_insensitivity() {
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("Admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("SuperAdmin").unwrap(), Role::SuperAdmin);
        assert_eq!(Role::from_str("EDITOR").unwrap(), Role::Editor);
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::SuperAdmin.as_str(), "superadmin");
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Editor.as_str(), "editor");
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::SuperAdmin.can_manage_admins());
        assert!(!Role::Admin.can_manage_admins());
        assert!(!Role::Editor.can_manage_admins());

        assert!(Role::SuperAdmin.can_view_notifications());
        assert!(Role::Admin.can_view_notifications());
        assert!(!Role::Editor.can_view_notifications());
    }

    #[test]
    fn test_role_serialization_consistency() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Editor] {
            let serialized = serde_json::to_string(&role).expect("Failed to serialize role");
            let deserialized: Role =
                serde_json::from_str(&serialized).expect("Failed to deserialize role");
            assert_eq!(role, deserialized);
        }
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"superadmin\"");
    }

    #[test]
    fn test_token_generation_and_validation() {
        env::set_var("JWT_SECRET", "test_secret");

        let token = generate_token(TEST_ID, "budi", "Budi Santoso", Role::Admin)
            .expect("Token generation failed");
        assert!(!token.is_empty());

        let claims = validate_token(&token).expect("Token validation failed");
        assert_eq!(claims.sub, TEST_ID);
        assert_eq!(claims.username, "budi");
        assert_eq!(claims.name, "Budi Santoso");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_token_with_all_roles() {
        env::set_var("JWT_SECRET", "test_secret");

        for role in [Role::SuperAdmin, Role::Admin, Role::Editor] {
            let token = generate_token(TEST_ID, "budi", "Budi", role.clone()).unwrap();
            let claims = validate_token(&token).unwrap();
            assert_eq!(claims.role, role);
        }
    }

    #[test]
    fn test_token_tampering() {
        env::set_var("JWT_SECRET", "test_secret");

        let token = generate_token(TEST_ID, "budi", "Budi", Role::Editor).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3, "JWT should have 3 parts");

        let tampered_token = format!("{}.{}tampered.{}", parts[0], parts[1], parts[2]);

        match validate_token(&tampered_token) {
            Err(JwtError::InvalidToken) => {}
            other => panic!("Expected InvalidToken error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_tokens() {
        env::set_var("JWT_SECRET", "test_secret");

        let malformed_tokens = [
            "",
            "not.a.jwt.token",
            "missing.segments",
            "invalid base64.parts.here",
            "eyJhbGciOiJIUzI1NiJ9",
        ];

        for token in &malformed_tokens {
            match validate_token(token) {
                Err(JwtError::InvalidToken) => {}
                other => panic!("Token '{}' should be rejected, got {:?}", token, other),
            }
        }
    }

    #[test]
    fn test_expired_token_rejection() {
        env::set_var("JWT_SECRET", "test_secret");

        let now = Utc::now();
        let claims = Claims {
            sub: TEST_ID.to_string(),
            username: "budi".to_string(),
            name: "Budi".to_string(),
            role: Role::Admin,
            iat: (now.timestamp() - 7200) as usize,
            exp: (now.timestamp() - 3600) as usize, // expired an hour ago
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test_secret".as_bytes()),
        )
        .unwrap();

        match validate_token(&token) {
            Err(JwtError::InvalidToken) => {}
            other => panic!("Expected InvalidToken for expired token, got {:?}", other),
        }
    }

    #[test]
    fn test_claims_issued_and_expiry_times() {
        env::set_var("JWT_SECRET", "test_secret");

        let now = Utc::now().timestamp() as usize;
        let token = generate_token(TEST_ID, "budi", "Budi", Role::Admin).unwrap();
        let claims = validate_token(&token).unwrap();

        assert!(
            claims.iat <= now + 1 && claims.iat >= now - 1,
            "Issued at time should be close to current time"
        );

        let expected_expiry = now + (24 * 60 * 60);
        assert!(
            claims.exp <= expected_expiry + 5 && claims.exp >= expected_expiry - 5,
            "Expiry should be approximately 24 hours from now"
        );
    }

    #[test]
    fn test_jwt_error_conversion() {
        assert_eq!(
            StatusCode::from(JwtError::MissingSecret),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCode::from(JwtError::TokenCreation),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCode::from(JwtError::InvalidToken),
            StatusCode::UNAUTHORIZED
        );
    }
}
