use sqlx::PgPool;
use tracing::{error, info};

use crate::notification::model::{NewNotification, Notification, NotificationError};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

/// Columns selected for the inbox, with `is_read` derived per requesting
/// admin from the read-receipt set.
const NOTIFICATION_COLUMNS: &str = "n.id, n.kind, n.message, n.payload, n.created_by, \
     n.created_by_name, n.created_at, \
     EXISTS (SELECT 1 FROM notification_reads r \
             WHERE r.notification_id = n.id AND r.admin_id = $1) AS is_read";

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a notification to the log.
    pub async fn create(&self, new: NewNotification) -> Result<i64, NotificationError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO notifications (kind, message, payload, created_by, created_by_name) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(new.kind.as_str())
        .bind(&new.message)
        .bind(&new.payload)
        .bind(&new.created_by)
        .bind(&new.created_by_name)
        .fetch_one(&self.pool)
        .await?;

        info!("Created {} notification {}", new.kind.as_str(), id);
        Ok(id)
    }

    /// Best-effort emission for content events: create the notification, log
    /// a failure, never propagate it. The triggering content operation must
    /// not be failed or rolled back by an inbox problem.
    pub async fn emit(&self, new: NewNotification) {
        if let Err(e) = self.create(new).await {
            error!("Notification emission failed: {}", e);
        }
    }

    /// List notifications newest-first, decorated with the per-admin read
    /// flag. With `unread_only`, only entries the admin has not read yet.
    pub async fn list(
        &self,
        admin_id: &str,
        unread_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, NotificationError> {
        let filter = if unread_only {
            "WHERE NOT EXISTS (SELECT 1 FROM notification_reads r \
              WHERE r.notification_id = n.id AND r.admin_id = $1)"
        } else {
            ""
        };

        let query = format!(
            "SELECT {} FROM notifications n {} ORDER BY n.created_at DESC LIMIT $2",
            NOTIFICATION_COLUMNS, filter
        );

        let notifications = sqlx::query_as::<_, Notification>(&query)
            .bind(admin_id)
            .bind(clamp_limit(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(notifications)
    }

    /// Count notifications the admin has not read yet.
    pub async fn count_unread(&self, admin_id: &str) -> Result<i64, NotificationError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications n \
             WHERE NOT EXISTS (SELECT 1 FROM notification_reads r \
               WHERE r.notification_id = n.id AND r.admin_id = $1)",
        )
        .bind(admin_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Idempotently mark one notification read for the admin and return the
    /// decorated record. Adding an existing receipt is a no-op, so two admins
    /// (or one admin retrying) can never conflict.
    pub async fn mark_read(
        &self,
        notification_id: i64,
        admin_id: &str,
    ) -> Result<Notification, NotificationError> {
        sqlx::query(
            "INSERT INTO notification_reads (notification_id, admin_id) \
             SELECT id, $2 FROM notifications WHERE id = $1 \
             ON CONFLICT (notification_id, admin_id) DO NOTHING",
        )
        .bind(notification_id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        let query = format!(
            "SELECT {} FROM notifications n WHERE n.id = $2",
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(admin_id)
            .bind(notification_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(NotificationError::NotFound)
    }

    /// Mark every notification read for the admin in one bulk statement, so
    /// there is no partial-failure window while notifications keep arriving.
    pub async fn mark_all_read(&self, admin_id: &str) -> Result<u64, NotificationError> {
        let result = sqlx::query(
            "INSERT INTO notification_reads (notification_id, admin_id) \
             SELECT id, $1 FROM notifications \
             ON CONFLICT (notification_id, admin_id) DO NOTHING",
        )
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamping() {
        assert_eq!(clamp_limit(None), 100);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(10_000)), 500);
    }

    #[tokio::test]
    async fn test_emit_swallows_store_failures() {
        // Pool points at nothing; create fails and emit must still return
        // normally, because content operations depend on that.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        let service = NotificationService::new(pool);

        service
            .emit(NewNotification::location_created(
                "Dompak",
                0.9,
                104.4,
                1,
                "1308162101990001",
                "Budi",
            ))
            .await;
    }
}
