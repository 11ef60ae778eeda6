use std::env;
use std::fmt;
use tracing::{info, warn};

/// Credentials for the external image host. Absent when the host is not
/// configured; upload endpoints then fail with a clear error instead of
/// panicking at startup.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Process configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub trust_proxy: bool,
    /// Identifier of the bootstrap super admin account. This record is seeded
    /// at startup, can never be deactivated, and can only be edited by itself.
    pub super_admin_id: String,
    pub super_admin_username: String,
    pub super_admin_name: String,
    pub super_admin_password: Option<String>,
    pub cloudinary: Option<CloudinaryConfig>,
    /// When set, error responses include detail strings beyond the message.
    pub dev_mode: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "required environment variable {} is not set", key),
            ConfigError::Invalid(key, value) => write!(f, "invalid value for {}: {}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = optional("PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid("PORT", e.to_string()))?;

        let database_url = required("DATABASE_URL")?;

        // JWT_SECRET is read by the token module on each call, but a missing
        // secret should fail at startup rather than on the first login.
        required("JWT_SECRET")?;

        let super_admin_id = required("SUPER_ADMIN_ID")?;
        if !is_valid_identifier(&super_admin_id) {
            return Err(ConfigError::Invalid("SUPER_ADMIN_ID", super_admin_id));
        }

        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if allowed_origins.is_empty() {
            warn!("ALLOWED_ORIGINS not set, CORS is permissive");
        }

        let trust_proxy = matches!(optional("TRUST_PROXY", "0").as_str(), "1" | "true");

        let cloudinary = match (
            env::var("CLOUDINARY_CLOUD_NAME"),
            env::var("CLOUDINARY_API_KEY"),
            env::var("CLOUDINARY_API_SECRET"),
        ) {
            (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => {
                warn!("Cloudinary credentials not set, image uploads will be rejected");
                None
            }
        };

        let config = Config {
            host: optional("HOST", "0.0.0.0"),
            port,
            database_url,
            allowed_origins,
            trust_proxy,
            super_admin_id,
            super_admin_username: optional("SUPER_ADMIN_USERNAME", "superadmin"),
            super_admin_name: optional("SUPER_ADMIN_NAME", "Super Admin"),
            super_admin_password: env::var("SUPER_ADMIN_PASSWORD").ok(),
            cloudinary,
            dev_mode: matches!(optional("DEV_MODE", "0").as_str(), "1" | "true"),
        };

        info!(
            "Configuration loaded: port={}, trust_proxy={}, cloudinary={}",
            config.port,
            config.trust_proxy,
            config.cloudinary.is_some()
        );

        Ok(config)
    }
}

/// Admin identifiers are fixed-format 16-digit national ID numbers.
pub fn is_valid_identifier(id: &str) -> bool {
    id.len() == 16 && id.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_format() {
        assert!(is_valid_identifier("1308162101990001"));
        assert!(!is_valid_identifier("130816210199000")); // 15 digits
        assert!(!is_valid_identifier("13081621019900012")); // 17 digits
        assert!(!is_valid_identifier("13081621019900a1"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::Missing("DATABASE_URL");
        assert_eq!(
            missing.to_string(),
            "required environment variable DATABASE_URL is not set"
        );

        let invalid = ConfigError::Invalid("PORT", "not-a-number".to_string());
        assert!(invalid.to_string().contains("PORT"));
    }
}
