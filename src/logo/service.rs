use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::logo::model::{Logo, LogoError, LogoFields};
use crate::upload::{delete_best_effort, ImageHost, ImageUpload};

const LOGO_FOLDER: &str = "narcotics-map/logos";
const DEFAULT_TITLE: &str = "BADAN NARKOTIKA NASIONAL";
const DEFAULT_SUBTITLE: &str = "KOTA TANJUNGPINANG";

pub struct LogoService {
    pool: PgPool,
    host: Arc<dyn ImageHost>,
}

impl LogoService {
    pub fn new(pool: PgPool, host: Arc<dyn ImageHost>) -> Self {
        Self { pool, host }
    }

    pub async fn get_active(&self) -> Result<Option<Logo>, LogoError> {
        let logo = sqlx::query_as::<_, Logo>(
            "SELECT * FROM logos WHERE is_active = true ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(logo)
    }

    pub async fn list(&self) -> Result<Vec<Logo>, LogoError> {
        let logos = sqlx::query_as::<_, Logo>("SELECT * FROM logos ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(logos)
    }

    /// Replace (or create) the active logo. Same asset ordering as the
    /// banner store: upload, persist, only then drop the old asset.
    pub async fn save(
        &self,
        fields: LogoFields,
        image: ImageUpload,
    ) -> Result<(Logo, bool), LogoError> {
        let asset = self
            .host
            .upload(image.data, LOGO_FOLDER, &image.filename)
            .await?;

        let old = match self.get_active().await {
            Ok(old) => old,
            Err(e) => {
                delete_best_effort(self.host.as_ref(), Some(&asset.public_id)).await;
                return Err(e);
            }
        };

        let created = old.is_none();
        let title = fields.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let subtitle = fields
            .subtitle
            .unwrap_or_else(|| DEFAULT_SUBTITLE.to_string());

        let persisted = match &old {
            Some(old_logo) => {
                sqlx::query_as::<_, Logo>(
                    "UPDATE logos SET image_url = $2, image_public_id = $3, title = $4, \
                        subtitle = $5, is_active = true, updated_at = now() \
                     WHERE id = $1 RETURNING *",
                )
                .bind(old_logo.id)
                .bind(&asset.url)
                .bind(&asset.public_id)
                .bind(&title)
                .bind(&subtitle)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Logo>(
                    "INSERT INTO logos (image_url, image_public_id, title, subtitle, is_active) \
                     VALUES ($1, $2, $3, $4, true) RETURNING *",
                )
                .bind(&asset.url)
                .bind(&asset.public_id)
                .bind(&title)
                .bind(&subtitle)
                .fetch_one(&self.pool)
                .await
            }
        };

        let logo = match persisted {
            Ok(logo) => logo,
            Err(e) => {
                delete_best_effort(self.host.as_ref(), Some(&asset.public_id)).await;
                return Err(e.into());
            }
        };

        if let Some(old_logo) = old {
            delete_best_effort(self.host.as_ref(), old_logo.image_public_id.as_deref()).await;
        }

        info!("Logo {} saved (created: {})", logo.id, created);
        Ok((logo, created))
    }

    pub async fn patch(
        &self,
        id: i64,
        title: Option<String>,
        subtitle: Option<String>,
    ) -> Result<Logo, LogoError> {
        sqlx::query_as::<_, Logo>(
            "UPDATE logos SET \
                title = COALESCE($2, title), \
                subtitle = COALESCE($3, subtitle), \
                updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(title)
        .bind(subtitle)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LogoError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), LogoError> {
        let logo = sqlx::query_as::<_, Logo>("SELECT * FROM logos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LogoError::NotFound)?;

        sqlx::query("DELETE FROM logos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        delete_best_effort(self.host.as_ref(), logo.image_public_id.as_deref()).await;

        info!("Deleted logo {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{MockImageHost, UploadError};
    use axum::body::Bytes;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_surfaces_upload_failure() {
        let mut mock = MockImageHost::new();
        mock.expect_upload()
            .times(1)
            .returning(|_, _, _| Err(UploadError::NotConfigured));
        mock.expect_delete().times(0);

        let service = LogoService::new(lazy_pool(), Arc::new(mock));
        let image = ImageUpload {
            data: Bytes::from_static(b"png bytes"),
            filename: "logo.png".to_string(),
        };

        let err = service.save(LogoFields::default(), image).await.err().unwrap();
        assert!(matches!(err, LogoError::Upload(UploadError::NotConfigured)));
    }
}
