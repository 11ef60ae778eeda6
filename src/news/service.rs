use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::auth::middleware::AuthUser;
use crate::news::model::{
    escape_like, NewsError, NewsFields, NewsResponse, NewsRow, NewsSort, Pagination,
};
use crate::notification::model::NewNotification;
use crate::notification::service::NotificationService;
use crate::upload::{delete_best_effort, ImageHost, ImageUpload};

const NEWS_FOLDER: &str = "narcotics-map/news";
const DEFAULT_PAGE_SIZE: i64 = 6;
const MAX_PAGE_SIZE: i64 = 50;

const JOINED_SELECT: &str = "SELECT n.*, a.display_name AS author_name \
     FROM news n LEFT JOIN admins a ON a.id = n.created_by";

/// Query parameters for the news list, already resolved against the caller's
/// authentication (unpublished rows are only reachable with a valid token).
#[derive(Debug, Default)]
pub struct NewsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub include_unpublished: bool,
    pub search: Option<String>,
    pub sort: Option<String>,
}

pub struct NewsService {
    pool: PgPool,
    host: Arc<dyn ImageHost>,
    notifications: NotificationService,
}

impl NewsService {
    pub fn new(pool: PgPool, host: Arc<dyn ImageHost>) -> Self {
        let notifications = NotificationService::new(pool.clone());
        Self {
            pool,
            host,
            notifications,
        }
    }

    /// Paginated news list with search across title, content and author name.
    pub async fn list(
        &self,
        query: NewsQuery,
    ) -> Result<(Vec<NewsResponse>, Pagination), NewsError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;

        let search = query.search.unwrap_or_default().trim().to_string();
        let pattern = format!("%{}%", escape_like(&search));
        let sort = NewsSort::parse(query.sort.as_deref());

        let filter = "WHERE ($1 OR n.is_published = true) \
             AND ($2 = '' OR n.title ILIKE $3 OR n.content ILIKE $3 \
                  OR COALESCE(n.editor, '') ILIKE $3 \
                  OR COALESCE(a.display_name, '') ILIKE $3)";

        let list_query = format!(
            "{} {} ORDER BY {} LIMIT $4 OFFSET $5",
            JOINED_SELECT,
            filter,
            sort.order_by()
        );

        let rows = sqlx::query_as::<_, NewsRow>(&list_query)
            .bind(query.include_unpublished)
            .bind(&search)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_query = format!(
            "SELECT COUNT(*) FROM news n LEFT JOIN admins a ON a.id = n.created_by {}",
            filter
        );
        let (total,): (i64,) = sqlx::query_as(&count_query)
            .bind(query.include_unpublished)
            .bind(&search)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let responses = rows.into_iter().map(NewsResponse::from).collect();
        Ok((responses, Pagination::new(page, limit, total)))
    }

    /// Single article. A public read counts as a view via the database's
    /// atomic increment; the admin panel passes `count_view = false`.
    pub async fn get(&self, id: i64, count_view: bool) -> Result<NewsResponse, NewsError> {
        if count_view {
            sqlx::query("UPDATE news SET views = views + 1 WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        let query = format!("{} WHERE n.id = $1", JOINED_SELECT);
        let row = sqlx::query_as::<_, NewsRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(NewsError::NotFound)?;

        Ok(NewsResponse::from(row))
    }

    /// Create an article. The image is uploaded first; the record is only
    /// persisted after the host confirms the upload. Emits a best-effort
    /// inbox notification that can never fail the creation itself.
    pub async fn create(
        &self,
        actor: &AuthUser,
        fields: NewsFields,
        image: ImageUpload,
    ) -> Result<NewsResponse, NewsError> {
        let title = fields
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| NewsError::InvalidInput("Title and content are required".to_string()))?;
        let content = fields
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| NewsError::InvalidInput("Title and content are required".to_string()))?;

        let asset = self
            .host
            .upload(image.data, NEWS_FOLDER, &image.filename)
            .await?;

        let inserted = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO news (title, image_url, image_public_id, content, created_by, is_published) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&title)
        .bind(&asset.url)
        .bind(&asset.public_id)
        .bind(&content)
        .bind(&actor.identifier)
        .bind(fields.is_published.unwrap_or(true))
        .fetch_one(&self.pool)
        .await;

        let (id,) = match inserted {
            Ok(row) => row,
            Err(e) => {
                // The record never existed, so remove the asset that would
                // otherwise be orphaned on the host.
                delete_best_effort(self.host.as_ref(), Some(&asset.public_id)).await;
                return Err(e.into());
            }
        };

        info!("Created news article {}", id);

        self.notifications
            .emit(NewNotification::news_created(
                id,
                &title,
                &actor.identifier,
                &actor.name,
            ))
            .await;

        self.get(id, false).await
    }

    /// Update an article, optionally replacing its image.
    ///
    /// Replacement ordering: upload the new asset, persist the record, then
    /// delete the old asset (best-effort). A failed upload or a failed save
    /// leaves the old image URL and reference untouched.
    pub async fn update(
        &self,
        id: i64,
        fields: NewsFields,
        image: Option<ImageUpload>,
    ) -> Result<NewsResponse, NewsError> {
        let existing = self.get(id, false).await?;

        let new_asset = match image {
            Some(image) => Some(
                self.host
                    .upload(image.data, NEWS_FOLDER, &image.filename)
                    .await?,
            ),
            None => None,
        };

        let result = sqlx::query(
            "UPDATE news SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                is_published = COALESCE($4, is_published), \
                image_url = COALESCE($5, image_url), \
                image_public_id = COALESCE($6, image_public_id), \
                updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(fields.title)
        .bind(fields.content)
        .bind(fields.is_published)
        .bind(new_asset.as_ref().map(|a| a.url.clone()))
        .bind(new_asset.as_ref().map(|a| a.public_id.clone()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                if new_asset.is_some() {
                    delete_best_effort(self.host.as_ref(), existing.image_public_id.as_deref())
                        .await;
                }
            }
            Err(e) => {
                if let Some(asset) = new_asset {
                    delete_best_effort(self.host.as_ref(), Some(&asset.public_id)).await;
                }
                return Err(e.into());
            }
        }

        self.get(id, false).await
    }

    /// Delete an article, then its image asset (best-effort).
    pub async fn delete(&self, id: i64) -> Result<(), NewsError> {
        let existing = self.get(id, false).await?;

        sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        delete_best_effort(self.host.as_ref(), existing.image_public_id.as_deref()).await;

        info!("Deleted news article {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Role;
    use crate::upload::{MockImageHost, UploadError};
    use axum::body::Bytes;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    fn actor() -> AuthUser {
        AuthUser {
            identifier: "1308162101990001".to_string(),
            username: "budi".to_string(),
            name: "Budi Santoso".to_string(),
            role: Role::Admin,
        }
    }

    fn image() -> ImageUpload {
        ImageUpload {
            data: Bytes::from_static(b"jpeg bytes"),
            filename: "razia.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_title_and_content() {
        let mut mock = MockImageHost::new();
        // Validation fails before the upload is even attempted.
        mock.expect_upload().times(0);

        let service = NewsService::new(lazy_pool(), Arc::new(mock));
        let fields = NewsFields {
            title: Some("  ".to_string()),
            content: Some("Isi berita".to_string()),
            is_published: None,
        };

        let err = service.create(&actor(), fields, image()).await.err().unwrap();
        assert!(matches!(err, NewsError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_fails_cleanly_when_upload_fails() {
        let mut mock = MockImageHost::new();
        mock.expect_upload()
            .times(1)
            .returning(|_, _, _| Err(UploadError::Rejected("invalid image".to_string())));
        // Nothing was uploaded, so nothing is cleaned up and no record is
        // written (the pool never connects in this test).
        mock.expect_delete().times(0);

        let service = NewsService::new(lazy_pool(), Arc::new(mock));
        let fields = NewsFields {
            title: Some("Razia".to_string()),
            content: Some("Isi berita".to_string()),
            is_published: Some(false),
        };

        let err = service.create(&actor(), fields, image()).await.err().unwrap();
        assert!(matches!(err, NewsError::Upload(_)));
    }
}
