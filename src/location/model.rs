use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// The fixed set of city neighborhoods a marker can belong to.
pub const NEIGHBORHOODS: [&str; 18] = [
    "Dompak",
    "Sei Jang",
    "Tanjung Ayun Sakti",
    "Tanjungpinang Timur",
    "Tanjung Unggat",
    "Bukit Cermin",
    "Kampung Baru",
    "Kemboja",
    "Tanjungpinang Barat",
    "Kampung Bugis",
    "Penyengat",
    "Senggarang",
    "Tanjungpinang Kota",
    "Air Raja",
    "Batu IX",
    "Kampung Bulang",
    "Melayu Kota Piring",
    "Pinang Kencana",
];

pub fn is_valid_neighborhood(name: &str) -> bool {
    NEIGHBORHOODS.contains(&name)
}

pub const DEFAULT_MARKER_COLOR: &str = "#FF5733";

#[derive(Debug, Serialize, FromRow, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub neighborhood: String,
    pub address: String,
    pub description: String,
    pub cases: i32,
    pub color: String,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub neighborhood: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub cases: Option<i32>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub neighborhood: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub cases: Option<i32>,
    pub color: Option<String>,
}

/// Per-neighborhood aggregate for the public statistics endpoint.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodStat {
    pub neighborhood: String,
    pub total_cases: i64,
    pub marker_count: i64,
    pub color: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Location not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighborhood_membership() {
        assert!(is_valid_neighborhood("Dompak"));
        assert!(is_valid_neighborhood("Pinang Kencana"));
        assert!(!is_valid_neighborhood("dompak")); // names are exact
        assert!(!is_valid_neighborhood("Jakarta Pusat"));
        assert!(!is_valid_neighborhood(""));
    }

    #[test]
    fn test_location_wire_shape() {
        let location = Location {
            id: 1,
            latitude: 0.9176,
            longitude: 104.4665,
            neighborhood: "Sei Jang".to_string(),
            address: "Jl. Pramuka".to_string(),
            description: String::new(),
            cases: 2,
            color: DEFAULT_MARKER_COLOR.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["neighborhood"], "Sei Jang");
        assert_eq!(json["cases"], 2);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
