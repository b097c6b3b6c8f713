use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::errors::{AppError, ResultExt};

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Batches are written one after another, so a small pool is enough.
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .context("Connecting to database")?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .context("Database connectivity check")?;

        Ok(Self { pool })
    }
}
