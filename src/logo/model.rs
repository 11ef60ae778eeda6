use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Serialize, FromRow, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Logo {
    pub id: i64,
    pub image_url: String,
    pub image_public_id: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub is_active: bool,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct LogoFields {
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PatchLogoRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LogoError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Logo not found")]
    NotFound,

    #[error("Upload failed: {0}")]
    Upload(#[from] crate::upload::UploadError),
}
