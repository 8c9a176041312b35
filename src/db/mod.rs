//! PostgreSQL pool and schema bootstrap

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

mod schema;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a pool and make sure the server answers before returning it.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;

        let db = Self { pool };
        db.ping().await?;
        tracing::info!(max_connections, "PostgreSQL pool ready");
        Ok(db)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes that do not exist yet.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        tracing::info!(statements = schema::STATEMENTS.len(), "Schema ready");
        Ok(())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
