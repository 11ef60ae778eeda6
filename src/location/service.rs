use sqlx::PgPool;
use tracing::info;

use crate::auth::middleware::AuthUser;
use crate::location::model::{
    is_valid_neighborhood, CreateLocationRequest, Location, LocationError, NeighborhoodStat,
    UpdateLocationRequest, DEFAULT_MARKER_COLOR,
};
use crate::notification::model::NewNotification;
use crate::notification::service::NotificationService;

pub struct LocationService {
    pool: PgPool,
    notifications: NotificationService,
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), LocationError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(LocationError::InvalidInput(
            "Latitude must be within [-90, 90] and longitude within [-180, 180]".to_string(),
        ));
    }
    Ok(())
}

fn validate_neighborhood(name: &str) -> Result<(), LocationError> {
    if !is_valid_neighborhood(name) {
        return Err(LocationError::InvalidInput(format!(
            "Unknown neighborhood: {}",
            name
        )));
    }
    Ok(())
}

fn validate_cases(cases: i32) -> Result<(), LocationError> {
    if cases < 1 {
        return Err(LocationError::InvalidInput(
            "Case count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

impl LocationService {
    pub fn new(pool: PgPool) -> Self {
        let notifications = NotificationService::new(pool.clone());
        Self { pool, notifications }
    }

    /// All locations, newest first (public).
    pub async fn list(&self) -> Result<Vec<Location>, LocationError> {
        let locations =
            sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(locations)
    }

    /// Per-neighborhood case totals, heaviest first (public).
    pub async fn statistics(&self) -> Result<Vec<NeighborhoodStat>, LocationError> {
        let stats = sqlx::query_as::<_, NeighborhoodStat>(
            "SELECT neighborhood, \
                    SUM(cases)::BIGINT AS total_cases, \
                    COUNT(*) AS marker_count, \
                    (array_agg(color ORDER BY created_at))[1] AS color \
             FROM locations GROUP BY neighborhood ORDER BY total_cases DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    pub async fn get(&self, id: i64) -> Result<Location, LocationError> {
        sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LocationError::NotFound)
    }

    /// Create a marker and emit a best-effort inbox notification. The
    /// notification can fail without affecting the created location.
    pub async fn create(
        &self,
        actor: &AuthUser,
        req: CreateLocationRequest,
    ) -> Result<Location, LocationError> {
        validate_coordinates(req.latitude, req.longitude)?;
        validate_neighborhood(&req.neighborhood)?;
        let cases = req.cases.unwrap_or(1);
        validate_cases(cases)?;

        let location = sqlx::query_as::<_, Location>(
            "INSERT INTO locations (latitude, longitude, neighborhood, address, description, cases, color) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(&req.neighborhood)
        .bind(req.address.unwrap_or_default())
        .bind(req.description.unwrap_or_default())
        .bind(cases)
        .bind(req.color.unwrap_or_else(|| DEFAULT_MARKER_COLOR.to_string()))
        .fetch_one(&self.pool)
        .await?;

        info!("Created location {} in {}", location.id, location.neighborhood);

        self.notifications
            .emit(NewNotification::location_created(
                &location.neighborhood,
                location.latitude,
                location.longitude,
                location.cases,
                &actor.identifier,
                &actor.name,
            ))
            .await;

        Ok(location)
    }

    /// Full update, last-write-wins.
    pub async fn update(
        &self,
        id: i64,
        req: UpdateLocationRequest,
    ) -> Result<Location, LocationError> {
        if let (Some(lat), Some(lng)) = (req.latitude, req.longitude) {
            validate_coordinates(lat, lng)?;
        }
        if let Some(ref neighborhood) = req.neighborhood {
            validate_neighborhood(neighborhood)?;
        }
        if let Some(cases) = req.cases {
            validate_cases(cases)?;
        }

        sqlx::query_as::<_, Location>(
            "UPDATE locations SET \
                latitude = COALESCE($2, latitude), \
                longitude = COALESCE($3, longitude), \
                neighborhood = COALESCE($4, neighborhood), \
                address = COALESCE($5, address), \
                description = COALESCE($6, description), \
                cases = COALESCE($7, cases), \
                color = COALESCE($8, color), \
                updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.neighborhood)
        .bind(req.address)
        .bind(req.description)
        .bind(req.cases)
        .bind(req.color)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LocationError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), LocationError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LocationError::NotFound);
        }

        info!("Deleted location {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Role;

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

    #[tokio::test]
    async fn test_create_rejects_unknown_neighborhood() {
        let service = LocationService::new(lazy_pool());
        let req = CreateLocationRequest {
            latitude: 0.9,
            longitude: 104.4,
            neighborhood: "Atlantis".to_string(),
            address: None,
            description: None,
            cases: None,
            color: None,
        };

        // Validation runs before any database access.
        let err = service.create(&actor(), req).await.err().unwrap();
        assert!(matches!(err, LocationError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_coordinates() {
        let service = LocationService::new(lazy_pool());
        let req = CreateLocationRequest {
            latitude: 91.0,
            longitude: 104.4,
            neighborhood: "Dompak".to_string(),
            address: None,
            description: None,
            cases: None,
            color: None,
        };

        let err = service.create(&actor(), req).await.err().unwrap();
        assert!(matches!(err, LocationError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_zero_cases() {
        let service = LocationService::new(lazy_pool());
        let req = CreateLocationRequest {
            latitude: 0.9,
            longitude: 104.4,
            neighborhood: "Dompak".to_string(),
            address: None,
            description: None,
            cases: Some(0),
            color: None,
        };

        let err = service.create(&actor(), req).await.err().unwrap();
        assert!(matches!(err, LocationError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_validates_partial_fields() {
        let service = LocationService::new(lazy_pool());
        let req = UpdateLocationRequest {
            latitude: None,
            longitude: None,
            neighborhood: Some("Nowhere".to_string()),
            address: None,
            description: None,
            cases: None,
            color: None,
        };

        let err = service.update(1, req).await.err().unwrap();
        assert!(matches!(err, LocationError::InvalidInput(_)));
    }
}
