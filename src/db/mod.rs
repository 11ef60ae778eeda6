use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Build the connection pool without blocking startup on the database.
///
/// The pool is lazy so the server can come up, serve `/health`, and keep
/// retrying in the background while the database is unreachable. Write
/// endpoints are gated on the connection flag maintained by [`spawn_monitor`].
pub fn connect_lazy(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)
}

/// Initialize the database schema
pub async fn init_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Initializing database schema...");

    // Read the schema SQL file
    let schema_path = Path::new("src/db/schema.sql");
    let schema_sql = match fs::read_to_string(schema_path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read schema.sql: {}", e);
            return Err(sqlx::Error::Io(e));
        }
    };

    // Execute the SQL script
    match sqlx::raw_sql(&schema_sql).execute(pool).await {
        Ok(_) => {
            info!("Database schema initialized successfully");
            Ok(())
        }
        Err(e) => {
            error!("Failed to initialize database schema: {}", e);
            Err(e)
        }
    }
}

/// Check if the admins table exists
pub async fn check_db_initialized(pool: &PgPool) -> bool {
    let result = sqlx::query(
        "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_schema = 'public' AND table_name = 'admins')",
    )
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => row.try_get::<bool, _>(0).unwrap_or(false),
        Err(_) => false,
    }
}

/// Probe the database once. Used by the health endpoint and the monitor task.
pub async fn ping(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}

/// Keep the shared connection flag in sync with the actual database state.
///
/// The flag feeds the write-gate middleware: while the database is down,
/// mutating requests are rejected with 503 instead of timing out one by one.
pub fn spawn_monitor(pool: PgPool, connected: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let mut was_connected = false;
        loop {
            let ok = ping(&pool).await;
            if ok && !was_connected {
                info!("Database connection established");
            } else if !ok && was_connected {
                warn!("Database connection lost, write endpoints will return 503");
            }
            was_connected = ok;
            connected.store(ok, Ordering::Relaxed);
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
    });
}
