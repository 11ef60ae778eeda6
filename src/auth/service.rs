use argon2::{
    password_hash::PasswordVerifier,
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::jwt::{generate_token, Role};
use super::middleware::AuthUser;
use crate::config::{is_valid_identifier, Config};

/// Admin record as exposed to the API (password hash never leaves the store).
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    #[serde(rename = "identifier")]
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

const ADMIN_COLUMNS: &str = "id, username, display_name, role, is_active, created_at, updated_at";

// Input data structures
pub struct RegisterData {
    pub identifier: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
}

pub struct LoginData {
    pub username: String,
    pub password: String,
}

pub struct UpdateData {
    pub username: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

// Result data structure
pub struct AuthResult {
    pub identifier: String,
    pub username: String,
    pub name: String,
    pub role: String,
    pub token: String,
}

// Service errors
#[derive(Debug)]
pub enum AuthError {
    InvalidInput(String),
    InvalidCredentials,
    Forbidden(String),
    NotFound,
    DatabaseError(String),
    TokenError,
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DatabaseError(_) | Self::TokenError | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::Forbidden(msg) => msg.clone(),
            Self::NotFound => "Admin not found".to_string(),
            Self::DatabaseError(msg) => format!("Database error: {}", msg),
            Self::TokenError => "Failed to generate auth token".to_string(),
            Self::InternalError(msg) => msg.clone(),
        }
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            AuthError::InternalError(format!("Password hashing failed: {}", e))
        })
}

/// Register a new admin. Only callers holding the manage-admins permission may
/// create accounts.
pub async fn register(
    pool: &PgPool,
    actor: &AuthUser,
    data: RegisterData,
) -> Result<AdminRecord, AuthError> {
    if !actor.role.can_manage_admins() {
        return Err(AuthError::Forbidden(
            "Only a super admin can add new admins".to_string(),
        ));
    }

    if data.username.is_empty() || data.password.is_empty() || data.name.is_empty() {
        return Err(AuthError::InvalidInput(
            "Username, password, name, and identifier are required".to_string(),
        ));
    }
    if !is_valid_identifier(&data.identifier) {
        return Err(AuthError::InvalidInput(
            "Identifier must be a 16-digit number".to_string(),
        ));
    }
    if data.password.len() < 6 {
        return Err(AuthError::InvalidInput(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let role_str = data.role.unwrap_or_else(|| "admin".to_string());
    let role = Role::from_str(&role_str).map_err(AuthError::InvalidInput)?;

    // Check identifier and username uniqueness
    let existing = sqlx::query_as::<_, (String,)>(
        "SELECT id FROM admins WHERE id = $1 OR username = $2",
    )
    .bind(&data.identifier)
    .bind(&data.username)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!("Database error while checking existing admin: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    if let Some((id,)) = existing {
        let msg = if id == data.identifier {
            "Identifier already registered"
        } else {
            "Username already in use"
        };
        return Err(AuthError::InvalidInput(msg.to_string()));
    }

    let password_hash = hash_password(&data.password)?;

    let record = sqlx::query_as::<_, AdminRecord>(&format!(
        "INSERT INTO admins (id, username, password_hash, display_name, role) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        ADMIN_COLUMNS
    ))
    .bind(&data.identifier)
    .bind(&data.username)
    .bind(&password_hash)
    .bind(&data.name)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!("Failed to insert new admin: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    info!("Admin created successfully with identifier: {}", record.id);
    Ok(record)
}

/// Admin login service
pub async fn login(pool: &PgPool, data: LoginData) -> Result<AuthResult, AuthError> {
    info!("Attempting login for username: {}", data.username);

    let admin = sqlx::query_as::<_, (String, String, String, String, String)>(
        "SELECT id, username, password_hash, display_name, role FROM admins \
         WHERE username = $1 AND is_active = true",
    )
    .bind(&data.username)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!("Database error while fetching admin: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    let (id, username, password_hash, name, role_str) = match admin {
        Some(admin) => admin,
        None => {
            info!("No active admin found with username: {}", data.username);
            return Err(AuthError::InvalidCredentials);
        }
    };

    // Verify password
    let parsed_hash = argon2::password_hash::PasswordHash::new(&password_hash).map_err(|e| {
        error!("Failed to parse password hash: {}", e);
        AuthError::InvalidCredentials
    })?;

    Argon2::default()
        .verify_password(data.password.as_bytes(), &parsed_hash)
        .map_err(|e| {
            info!("Password verification failed: {}", e);
            AuthError::InvalidCredentials
        })?;

    let role = Role::from_str(&role_str).map_err(|e| {
        error!("Stored role is invalid: {}", e);
        AuthError::InternalError(e)
    })?;

    let token = generate_token(&id, &username, &name, role).map_err(|e| {
        error!("Token generation failed: {:?}", e);
        AuthError::TokenError
    })?;

    info!("Login successful for admin: {}", id);

    Ok(AuthResult {
        identifier: id,
        username,
        name,
        role: role_str,
        token,
    })
}

/// Fetch the current admin's record
pub async fn me(pool: &PgPool, identifier: &str) -> Result<AdminRecord, AuthError> {
    sqlx::query_as::<_, AdminRecord>(&format!(
        "SELECT {} FROM admins WHERE id = $1",
        ADMIN_COLUMNS
    ))
    .bind(identifier)
    .fetch_optional(pool)
    .await
    .map_err(|e| AuthError::DatabaseError(e.to_string()))?
    .ok_or(AuthError::NotFound)
}

/// List all admins, newest first
pub async fn list(pool: &PgPool, actor: &AuthUser) -> Result<Vec<AdminRecord>, AuthError> {
    if !actor.role.can_manage_admins() {
        return Err(AuthError::Forbidden(
            "Only a super admin can list admin accounts".to_string(),
        ));
    }

    sqlx::query_as::<_, AdminRecord>(&format!(
        "SELECT {} FROM admins ORDER BY created_at DESC",
        ADMIN_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(|e| AuthError::DatabaseError(e.to_string()))
}

/// Update an admin record.
///
/// The bootstrap super admin record can only be edited by itself; every other
/// cross-account edit requires the manage-admins permission.
pub async fn update(
    pool: &PgPool,
    actor: &AuthUser,
    super_admin_id: &str,
    target_id: &str,
    data: UpdateData,
) -> Result<AdminRecord, AuthError> {
    if target_id == super_admin_id && actor.identifier != super_admin_id {
        return Err(AuthError::Forbidden(
            "Only the super admin can edit the super admin account".to_string(),
        ));
    }
    if target_id != actor.identifier && !actor.role.can_manage_admins() {
        return Err(AuthError::Forbidden(
            "Only a super admin can edit other admin accounts".to_string(),
        ));
    }
    if target_id == super_admin_id && data.is_active == Some(false) {
        return Err(AuthError::Forbidden(
            "The super admin account cannot be deactivated".to_string(),
        ));
    }

    let current = me(pool, target_id).await?;

    // Check username uniqueness when it changes
    if let Some(ref username) = data.username {
        if username != &current.username {
            let taken = sqlx::query_as::<_, (String,)>(
                "SELECT id FROM admins WHERE username = $1 AND id != $2",
            )
            .bind(username)
            .bind(target_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

            if taken.is_some() {
                return Err(AuthError::InvalidInput("Username already in use".to_string()));
            }
        }
    }

    let record = sqlx::query_as::<_, AdminRecord>(&format!(
        "UPDATE admins SET \
            username = COALESCE($2, username), \
            display_name = COALESCE($3, display_name), \
            is_active = COALESCE($4, is_active), \
            updated_at = now() \
         WHERE id = $1 RETURNING {}",
        ADMIN_COLUMNS
    ))
    .bind(target_id)
    .bind(data.username)
    .bind(data.name)
    .bind(data.is_active)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!("Failed to update admin {}: {}", target_id, e);
        AuthError::DatabaseError(e.to_string())
    })?
    .ok_or(AuthError::NotFound)?;

    info!("Admin {} updated by {}", target_id, actor.identifier);
    Ok(record)
}

/// Deactivate an admin account. Accounts are never hard-deleted; login and
/// every privileged path filter on `is_active`.
pub async fn deactivate(
    pool: &PgPool,
    actor: &AuthUser,
    super_admin_id: &str,
    target_id: &str,
) -> Result<(), AuthError> {
    if target_id == super_admin_id {
        return Err(AuthError::Forbidden(
            "The super admin account cannot be deleted".to_string(),
        ));
    }
    if !actor.role.can_manage_admins() {
        return Err(AuthError::Forbidden(
            "Only a super admin can delete admin accounts".to_string(),
        ));
    }

    let result = sqlx::query("UPDATE admins SET is_active = false, updated_at = now() WHERE id = $1")
        .bind(target_id)
        .execute(pool)
        .await
        .map_err(|e| {
            error!("Failed to deactivate admin {}: {}", target_id, e);
            AuthError::DatabaseError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AuthError::NotFound);
    }

    info!("Admin {} deactivated by {}", target_id, actor.identifier);
    Ok(())
}

/// Reset an admin's password. Allowed for the account itself and for holders
/// of the manage-admins permission; the bootstrap record stays self-only.
pub async fn reset_password(
    pool: &PgPool,
    actor: &AuthUser,
    super_admin_id: &str,
    target_id: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    if target_id == super_admin_id && actor.identifier != super_admin_id {
        return Err(AuthError::Forbidden(
            "Only the super admin can reset the super admin password".to_string(),
        ));
    }
    if target_id != actor.identifier && !actor.role.can_manage_admins() {
        return Err(AuthError::Forbidden(
            "Only a super admin can reset other admins' passwords".to_string(),
        ));
    }
    if new_password.len() < 6 {
        return Err(AuthError::InvalidInput(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let password_hash = hash_password(new_password)?;

    let result = sqlx::query("UPDATE admins SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(target_id)
        .bind(&password_hash)
        .execute(pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(AuthError::NotFound);
    }

    info!("Password reset for admin {} by {}", target_id, actor.identifier);
    Ok(())
}

/// Seed the bootstrap super admin from configuration when it does not exist.
pub async fn bootstrap_super_admin(pool: &PgPool, config: &Config) -> Result<(), AuthError> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM admins WHERE id = $1")
        .bind(&config.super_admin_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    if existing.is_some() {
        return Ok(());
    }

    let password = match &config.super_admin_password {
        Some(p) if p.len() >= 6 => p,
        _ => {
            warn!(
                "Super admin {} not found and SUPER_ADMIN_PASSWORD not set, skipping bootstrap",
                config.super_admin_id
            );
            return Ok(());
        }
    };

    let password_hash = hash_password(password)?;

    sqlx::query(
        "INSERT INTO admins (id, username, password_hash, display_name, role) \
         VALUES ($1, $2, $3, $4, 'superadmin') ON CONFLICT (id) DO NOTHING",
    )
    .bind(&config.super_admin_id)
    .bind(&config.super_admin_username)
    .bind(&password_hash)
    .bind(&config.super_admin_name)
    .execute(pool)
    .await
    .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    info!("Bootstrap super admin {} created", config.super_admin_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    fn actor(role: Role) -> AuthUser {
        AuthUser {
            identifier: "9999999999999999".to_string(),
            username: "actor".to_string(),
            name: "Actor".to_string(),
            role,
        }
    }

    const SUPER_ID: &str = "1308162101990001";

    #[tokio::test]
    async fn test_register_requires_manage_admins_permission() {
        let pool = lazy_pool();
        let data = RegisterData {
            identifier: "1234567890123456".to_string(),
            username: "new".to_string(),
            password: "secret1".to_string(),
            name: "New Admin".to_string(),
            role: None,
        };

        // Permission is checked before any database access, so a lazy pool
        // never connects here.
        let err = register(&pool, &actor(Role::Admin), data).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_identifier() {
        let pool = lazy_pool();
        let data = RegisterData {
            identifier: "not-a-ktp-number".to_string(),
            username: "new".to_string(),
            password: "secret1".to_string(),
            name: "New Admin".to_string(),
            role: None,
        };

        let err = register(&pool, &actor(Role::SuperAdmin), data).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("16-digit"));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let pool = lazy_pool();
        let data = RegisterData {
            identifier: "1234567890123456".to_string(),
            username: "new".to_string(),
            password: "12345".to_string(),
            name: "New Admin".to_string(),
            role: None,
        };

        let err = register(&pool, &actor(Role::SuperAdmin), data).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_role() {
        let pool = lazy_pool();
        let data = RegisterData {
            identifier: "1234567890123456".to_string(),
            username: "new".to_string(),
            password: "secret1".to_string(),
            name: "New Admin".to_string(),
            role: Some("analyst".to_string()),
        };

        let err = register(&pool, &actor(Role::SuperAdmin), data).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_super_admin_record_protected_from_others() {
        let pool = lazy_pool();

        let err = update(
            &pool,
            &actor(Role::SuperAdmin), // another privileged admin, not the bootstrap account
            SUPER_ID,
            SUPER_ID,
            UpdateData {
                username: None,
                name: Some("Hijacked".to_string()),
                is_active: None,
            },
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_super_admin_cannot_be_deleted() {
        let pool = lazy_pool();

        // Even a privileged actor gets 403 before any database access.
        let err = deactivate(&pool, &actor(Role::SuperAdmin), SUPER_ID, SUPER_ID)
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_deactivate_requires_permission() {
        let pool = lazy_pool();

        let err = deactivate(&pool, &actor(Role::Editor), SUPER_ID, "1234567890123456")
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_reset_password_permission_rules() {
        let pool = lazy_pool();

        // Editors cannot reset other accounts.
        let err = reset_password(
            &pool,
            &actor(Role::Editor),
            SUPER_ID,
            "1234567890123456",
            "newsecret",
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        // Nobody but the bootstrap account touches its password.
        let err = reset_password(&pool, &actor(Role::SuperAdmin), SUPER_ID, SUPER_ID, "newsecret")
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = argon2::password_hash::PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password("correct horse".as_bytes(), &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password("wrong horse".as_bytes(), &parsed)
            .is_err());
    }
}
