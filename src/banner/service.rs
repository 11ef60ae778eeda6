use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::banner::model::{
    is_valid_image_fit, BannerError, BannerFields, BannerResponse, BannerRow,
};
use crate::upload::{delete_best_effort, ImageHost, ImageUpload};

const BANNER_FOLDER: &str = "narcotics-map/banners";

pub struct BannerService {
    pool: PgPool,
    host: Arc<dyn ImageHost>,
}

impl BannerService {
    pub fn new(pool: PgPool, host: Arc<dyn ImageHost>) -> Self {
        Self { pool, host }
    }

    /// The currently active banner, if any (public).
    pub async fn get_active(&self) -> Result<Option<BannerResponse>, BannerError> {
        let row = sqlx::query_as::<_, BannerRow>(
            "SELECT * FROM banners WHERE is_active = true ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(BannerResponse::from))
    }

    /// All banners, newest first (admin).
    pub async fn list(&self) -> Result<Vec<BannerResponse>, BannerError> {
        let rows = sqlx::query_as::<_, BannerRow>("SELECT * FROM banners ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BannerResponse::from).collect())
    }

    /// Replace (or create) the active banner.
    ///
    /// Ordering protects against orphaned assets: the new image is uploaded
    /// first, the record is persisted pointing at it, and only then is the
    /// old asset deleted (best-effort). If persisting fails, the freshly
    /// uploaded asset is removed instead and the old banner stays intact.
    pub async fn save(
        &self,
        fields: BannerFields,
        image: ImageUpload,
    ) -> Result<(BannerResponse, bool), BannerError> {
        if let Some(ref fit) = fields.image_fit {
            if !is_valid_image_fit(fit) {
                return Err(BannerError::InvalidInput(format!(
                    "Unknown image fit: {}",
                    fit
                )));
            }
        }

        let asset = self
            .host
            .upload(image.data, BANNER_FOLDER, &image.filename)
            .await?;

        let old = match self.find_active_row().await {
            Ok(old) => old,
            Err(e) => {
                delete_best_effort(self.host.as_ref(), Some(&asset.public_id)).await;
                return Err(e);
            }
        };

        let created = old.is_none();
        let position = fields.image_position.unwrap_or_default();
        let caption = fields
            .caption
            .unwrap_or_else(|| "Informasi Area Rawan Narkoba".to_string());
        let location = fields
            .location
            .unwrap_or_else(|| "Kota Tanjungpinang".to_string());
        let image_fit = fields.image_fit.unwrap_or_else(|| "cover".to_string());

        let persisted = match &old {
            Some(old_row) => {
                sqlx::query_as::<_, BannerRow>(
                    "UPDATE banners SET image_url = $2, image_public_id = $3, caption = $4, \
                        location = $5, image_fit = $6, image_pos_x = $7, image_pos_y = $8, \
                        is_active = true, updated_at = now() \
                     WHERE id = $1 RETURNING *",
                )
                .bind(old_row.id)
                .bind(&asset.url)
                .bind(&asset.public_id)
                .bind(&caption)
                .bind(&location)
                .bind(&image_fit)
                .bind(position.x)
                .bind(position.y)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, BannerRow>(
                    "INSERT INTO banners (image_url, image_public_id, caption, location, \
                        image_fit, image_pos_x, image_pos_y, is_active) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, true) RETURNING *",
                )
                .bind(&asset.url)
                .bind(&asset.public_id)
                .bind(&caption)
                .bind(&location)
                .bind(&image_fit)
                .bind(position.x)
                .bind(position.y)
                .fetch_one(&self.pool)
                .await
            }
        };

        let row = match persisted {
            Ok(row) => row,
            Err(e) => {
                // The old banner is still the source of truth; remove the
                // asset that never made it into a record.
                delete_best_effort(self.host.as_ref(), Some(&asset.public_id)).await;
                return Err(e.into());
            }
        };

        if let Some(old_row) = old {
            delete_best_effort(self.host.as_ref(), old_row.image_public_id.as_deref()).await;
        }

        info!("Banner {} saved (created: {})", row.id, created);
        Ok((BannerResponse::from(row), created))
    }

    /// Update caption/layout fields without touching the image (admin).
    pub async fn patch(
        &self,
        id: i64,
        caption: Option<String>,
        location: Option<String>,
        image_fit: Option<String>,
        position: Option<crate::banner::model::ImagePosition>,
    ) -> Result<BannerResponse, BannerError> {
        if let Some(ref fit) = image_fit {
            if !is_valid_image_fit(fit) {
                return Err(BannerError::InvalidInput(format!(
                    "Unknown image fit: {}",
                    fit
                )));
            }
        }

        let row = sqlx::query_as::<_, BannerRow>(
            "UPDATE banners SET \
                caption = COALESCE($2, caption), \
                location = COALESCE($3, location), \
                image_fit = COALESCE($4, image_fit), \
                image_pos_x = COALESCE($5, image_pos_x), \
                image_pos_y = COALESCE($6, image_pos_y), \
                updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(caption)
        .bind(location)
        .bind(image_fit)
        .bind(position.map(|p| p.x))
        .bind(position.map(|p| p.y))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BannerError::NotFound)?;

        Ok(BannerResponse::from(row))
    }

    /// Delete a banner and then its external asset (best-effort).
    pub async fn delete(&self, id: i64) -> Result<(), BannerError> {
        let row = sqlx::query_as::<_, BannerRow>("SELECT * FROM banners WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(BannerError::NotFound)?;

        sqlx::query("DELETE FROM banners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        delete_best_effort(self.host.as_ref(), row.image_public_id.as_deref()).await;

        info!("Deleted banner {}", id);
        Ok(())
    }

    async fn find_active_row(&self) -> Result<Option<BannerRow>, BannerError> {
        let row = sqlx::query_as::<_, BannerRow>(
            "SELECT * FROM banners WHERE is_active = true ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
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

    fn image() -> ImageUpload {
        ImageUpload {
            data: Bytes::from_static(b"fake image bytes"),
            filename: "banner.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_rejects_bad_image_fit_before_upload() {
        let mut mock = MockImageHost::new();
        mock.expect_upload().times(0);
        mock.expect_delete().times(0);

        let service = BannerService::new(lazy_pool(), Arc::new(mock));
        let fields = BannerFields {
            image_fit: Some("stretch".to_string()),
            ..Default::default()
        };

        let err = service.save(fields, image()).await.err().unwrap();
        assert!(matches!(err, BannerError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_save_surfaces_upload_failure_without_touching_store() {
        let mut mock = MockImageHost::new();
        mock.expect_upload()
            .times(1)
            .returning(|_, _, _| Err(UploadError::Rejected("quota exceeded".to_string())));
        // No upload succeeded, so nothing must be cleaned up either.
        mock.expect_delete().times(0);

        let service = BannerService::new(lazy_pool(), Arc::new(mock));

        let err = service.save(BannerFields::default(), image()).await.err().unwrap();
        assert!(matches!(err, BannerError::Upload(_)));
    }
}
