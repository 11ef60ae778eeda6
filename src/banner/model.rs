use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const IMAGE_FITS: [&str; 4] = ["cover", "contain", "fill", "scale-down"];

pub fn is_valid_image_fit(fit: &str) -> bool {
    IMAGE_FITS.contains(&fit)
}

/// Banner row as stored.
#[derive(Debug, FromRow, Clone)]
pub struct BannerRow {
    pub id: i64,
    pub image_url: String,
    pub image_public_id: Option<String>,
    pub caption: String,
    pub location: String,
    pub image_fit: String,
    pub image_pos_x: i32,
    pub image_pos_y: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Focal point of the banner image, in percent of width/height.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, ToSchema)]
pub struct ImagePosition {
    pub x: i32,
    pub y: i32,
}

impl Default for ImagePosition {
    fn default() -> Self {
        Self { x: 50, y: 50 }
    }
}

impl ImagePosition {
    /// Parse the position from its form-field representation, falling back
    /// to the centered default when the value is malformed.
    pub fn parse_lenient(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BannerResponse {
    pub id: i64,
    pub image_url: String,
    pub image_public_id: Option<String>,
    pub caption: String,
    pub location: String,
    pub image_fit: String,
    pub image_position: ImagePosition,
    pub is_active: bool,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

impl From<BannerRow> for BannerResponse {
    fn from(row: BannerRow) -> Self {
        Self {
            id: row.id,
            image_url: row.image_url,
            image_public_id: row.image_public_id,
            caption: row.caption,
            location: row.location,
            image_fit: row.image_fit,
            image_position: ImagePosition {
                x: row.image_pos_x,
                y: row.image_pos_y,
            },
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Text fields accompanying a banner upload.
#[derive(Debug, Default)]
pub struct BannerFields {
    pub caption: Option<String>,
    pub location: Option<String>,
    pub image_fit: Option<String>,
    pub image_position: Option<ImagePosition>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchBannerRequest {
    pub caption: Option<String>,
    pub location: Option<String>,
    pub image_fit: Option<String>,
    pub image_position: Option<ImagePosition>,
}

#[derive(Debug, thiserror::Error)]
pub enum BannerError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Banner not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] crate::upload::UploadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_fit_values() {
        assert!(is_valid_image_fit("cover"));
        assert!(is_valid_image_fit("scale-down"));
        assert!(!is_valid_image_fit("stretch"));
        assert!(!is_valid_image_fit("COVER"));
    }

    #[test]
    fn test_position_parsing_falls_back_to_center() {
        let pos = ImagePosition::parse_lenient("{\"x\": 30, \"y\": 70}");
        assert_eq!(pos.x, 30);
        assert_eq!(pos.y, 70);

        let fallback = ImagePosition::parse_lenient("not json");
        assert_eq!(fallback.x, 50);
        assert_eq!(fallback.y, 50);
    }

    #[test]
    fn test_banner_response_shape() {
        let row = BannerRow {
            id: 1,
            image_url: "https://res.example/banner.jpg".to_string(),
            image_public_id: Some("banners/abc".to_string()),
            caption: "Informasi Area Rawan Narkoba".to_string(),
            location: "Kota Tanjungpinang".to_string(),
            image_fit: "cover".to_string(),
            image_pos_x: 40,
            image_pos_y: 60,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(BannerResponse::from(row)).unwrap();
        assert_eq!(json["imageUrl"], "https://res.example/banner.jpg");
        assert_eq!(json["imagePosition"]["x"], 40);
        assert_eq!(json["imagePosition"]["y"], 60);
        assert_eq!(json["isActive"], true);
    }
}
