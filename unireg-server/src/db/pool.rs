//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits. The pool is the
//! handle cached by the connection manager.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::repos::{LeadRepo, UniversityRepo};
use super::{migrations, DbError, Store};
use crate::connection::Connector;
use crate::models::{
    Lead, NewLead, ObjectId, Paginated, Pagination, University, UniversityFilter,
    UniversityProfile, UniversitySummary,
};

/// Default maximum connections for the pool.
/// Kept low: one process serves one short-lived invocation at a time.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default wait for a free pooled connection
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/unireg").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS, DEFAULT_ACQUIRE_TIMEOUT).await
}

/// Create a PostgreSQL connection pool with custom options.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Maximum number of connections in the pool
/// * `acquire_timeout` - How long a query waits for a pooled connection
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}

/// Postgres-backed [`Store`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn is_healthy(&self) -> bool {
        !self.pool.is_closed()
    }

    async fn list_universities(
        &self,
        filter: &UniversityFilter,
        page: Pagination,
    ) -> Result<Paginated<UniversitySummary>, DbError> {
        UniversityRepo::new(&self.pool).list(filter, page).await
    }

    async fn get_university(&self, id: &ObjectId) -> Result<University, DbError> {
        UniversityRepo::new(&self.pool).get(id).await
    }

    async fn insert_lead(&self, lead: &NewLead) -> Result<Lead, DbError> {
        LeadRepo::new(&self.pool).insert(lead).await
    }

    async fn replace_universities(
        &self,
        profiles: &[UniversityProfile],
    ) -> Result<Vec<University>, DbError> {
        UniversityRepo::new(&self.pool).replace_all(profiles).await
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Postgres pool closed");
    }
}

/// Opens a [`PgStore`] and brings the schema up to date.
#[derive(Debug, Clone)]
pub struct PgConnector {
    database_url: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PgConnector {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self) -> Result<Arc<dyn Store>, DbError> {
        let pool = create_pool_with_options(
            &self.database_url,
            self.max_connections,
            self.acquire_timeout,
        )
        .await?;

        migrations::run(&pool).await?;

        Ok(Arc::new(PgStore::new(pool)))
    }
}
