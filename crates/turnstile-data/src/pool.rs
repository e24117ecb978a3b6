//! Connection pool construction and embedded migrations.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{DataError, Result};

const MAX_CONNECTIONS: u32 = 10;

/// Open a pool against `database_url` and apply pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|source| DataError::ConnectFailed { source })?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Apply the embedded `users`/`todos` migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|source| DataError::MigrationFailed { source })?;
    info!("database migrations applied");
    Ok(())
}
