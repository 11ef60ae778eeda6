use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Kind of system event a notification describes. Stored as lowercase text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Location,
    News,
    System,
    Custom,
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::Location => "location",
            NotificationKind::News => "news",
            NotificationKind::System => "system",
            NotificationKind::Custom => "custom",
        }
    }
}

/// A notification as returned to the admin inbox. `is_read` is derived for
/// the requesting admin from the read-receipt set; it is not stored state.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub created_by: Option<String>,
    pub created_by_name: String,
    pub is_read: bool,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
}

/// Input for notification creation.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub message: String,
    pub payload: serde_json::Value,
    pub created_by: Option<String>,
    pub created_by_name: String,
}

impl NewNotification {
    /// Snapshot of a freshly added map location. Denormalized so the inbox
    /// entry stays meaningful if the location is edited or removed later.
    pub fn location_created(
        neighborhood: &str,
        latitude: f64,
        longitude: f64,
        cases: i32,
        created_by: &str,
        created_by_name: &str,
    ) -> Self {
        Self {
            kind: NotificationKind::Location,
            message: format!("New drug-prone location added in {}", neighborhood),
            payload: json!({
                "neighborhood": neighborhood,
                "latitude": latitude,
                "longitude": longitude,
                "cases": cases,
            }),
            created_by: Some(created_by.to_string()),
            created_by_name: created_by_name.to_string(),
        }
    }

    /// Snapshot of a newly created news article.
    pub fn news_created(news_id: i64, title: &str, created_by: &str, created_by_name: &str) -> Self {
        Self {
            kind: NotificationKind::News,
            message: format!("News article published: {}", title),
            payload: json!({
                "newsId": news_id,
                "title": title,
            }),
            created_by: Some(created_by.to_string()),
            created_by_name: created_by_name.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Notification not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::Location).unwrap(),
            "\"location\""
        );
        let parsed: NotificationKind = serde_json::from_str("\"news\"").unwrap();
        assert_eq!(parsed, NotificationKind::News);
        assert_eq!(NotificationKind::Custom.as_str(), "custom");
    }

    #[test]
    fn test_notification_serializes_kind_as_type() {
        let n = Notification {
            id: 7,
            kind: "location".to_string(),
            message: "New drug-prone location added in Dompak".to_string(),
            payload: json!({"neighborhood": "Dompak"}),
            created_by: Some("1308162101990001".to_string()),
            created_by_name: "Budi".to_string(),
            is_read: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "location");
        assert_eq!(json["isRead"], false);
        assert_eq!(json["createdByName"], "Budi");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_location_snapshot_payload() {
        let n = NewNotification::location_created(
            "Sei Jang",
            0.9176,
            104.4665,
            3,
            "1308162101990001",
            "Budi",
        );

        assert_eq!(n.kind, NotificationKind::Location);
        assert!(n.message.contains("Sei Jang"));
        assert_eq!(n.payload["neighborhood"], "Sei Jang");
        assert_eq!(n.payload["latitude"], 0.9176);
        assert_eq!(n.payload["cases"], 3);
        assert_eq!(n.created_by.as_deref(), Some("1308162101990001"));
    }

    #[test]
    fn test_news_snapshot_payload() {
        let n = NewNotification::news_created(12, "Razia di Batu IX", "1308162101990001", "Budi");
        assert_eq!(n.kind, NotificationKind::News);
        assert_eq!(n.payload["newsId"], 12);
        assert_eq!(n.payload["title"], "Razia di Batu IX");
    }
}
