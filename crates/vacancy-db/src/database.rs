use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{Connection, Executor, PgPool};
use vacancy_core::AppError;

use crate::config::DatabaseConfig;
use crate::repository::VacancyRepository;

/// Table definitions, executed one at a time. Each statement is idempotent.
pub const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS employers (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        vacancies_count INTEGER DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS vacancies (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        salary_min INTEGER,
        salary_max INTEGER,
        employer_id INTEGER REFERENCES employers(id)
    )"#,
];

/// Owns the connection pool, provisions the schema and hands out the
/// repository.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Make sure the configured database exists, creating it through the
    /// administrative database if needed. Returns `true` if it was created.
    ///
    /// Callers treat failures as non-fatal: a missing database will surface
    /// again, loudly, in [`connect`](Self::connect).
    pub async fn create_database(config: &DatabaseConfig) -> Result<bool, AppError> {
        let mut conn = PgConnection::connect_with(&config.admin_connect_options())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to admin database: {e}")))?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM pg_catalog.pg_database WHERE datname = $1")
                .bind(&config.dbname)
                .fetch_optional(&mut conn)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let created = if exists.is_some() {
            tracing::info!(dbname = %config.dbname, "Database already exists");
            false
        } else {
            // CREATE DATABASE cannot be prepared; send it as a simple query.
            let statement = format!("CREATE DATABASE {}", quote_identifier(&config.dbname));
            conn.execute(statement.as_str())
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create database: {e}")))?;
            tracing::info!(dbname = %config.dbname, "Database created");
            true
        };

        conn.close()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(created)
    }

    /// Connect to PostgreSQL with the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        tracing::info!(dbname = %config.dbname, host = %config.host, "Connected to database");
        Ok(Self { pool })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `employers` and `vacancies` tables if they do not exist.
    pub async fn create_tables(&self) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create tables: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::info!("Tables are in place");
        Ok(())
    }

    /// Get a [`VacancyRepository`] backed by this pool.
    pub fn vacancy_repo(&self) -> VacancyRepository {
        VacancyRepository::new(self.pool.clone())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every connection. Calling it again is a no-op.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::debug!("Database connection closed");
        }
    }
}

/// Quote a PostgreSQL identifier, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
