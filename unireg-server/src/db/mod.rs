//! Database layer - store seam, connection pool and repositories
//!
//! # Design Principles
//!
//! - Handlers never see a pool directly, only `Arc<dyn Store>` handed out
//!   by the connection manager
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step operations (seeding)

pub mod migrations;
pub mod pool;
pub mod repos;

use std::time::Duration;

use async_trait::async_trait;

use crate::models::{
    Lead, NewLead, ObjectId, Paginated, Pagination, University, UniversityFilter,
    UniversityProfile, UniversitySummary,
};

pub use pool::{create_pool, create_pool_with_options, PgConnector, PgStore};
pub use repos::{LeadRepo, UniversityRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} already exists")]
    Conflict { resource: &'static str },

    #[error("connection attempt timed out after {after:?}")]
    Timeout { after: Duration },
}

impl DbError {
    /// Whether the error means the store itself is unreachable, as opposed
    /// to a problem with one particular query.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Sqlx(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            Self::Timeout { .. } => true,
            Self::NotFound { .. } | Self::Conflict { .. } => false,
        }
    }
}

/// Data access used by the HTTP layer.
///
/// Implemented by [`PgStore`]; tests substitute an in-memory store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness check of the underlying handle. Must not do I/O.
    fn is_healthy(&self) -> bool;

    /// Page of university summaries matching the filter.
    async fn list_universities(
        &self,
        filter: &UniversityFilter,
        page: Pagination,
    ) -> Result<Paginated<UniversitySummary>, DbError>;

    /// Full university document, `DbError::NotFound` when absent.
    async fn get_university(&self, id: &ObjectId) -> Result<University, DbError>;

    /// Insert a lead, `DbError::Conflict` when the (email, phone) pair exists.
    async fn insert_lead(&self, lead: &NewLead) -> Result<Lead, DbError>;

    /// Replace every university with the given profiles.
    async fn replace_universities(
        &self,
        profiles: &[UniversityProfile],
    ) -> Result<Vec<University>, DbError>;

    /// Release the handle. Later calls may fail with a connectivity error.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_connectivity_errors() {
        assert!(DbError::Sqlx(sqlx::Error::PoolTimedOut).is_connectivity());
        assert!(DbError::Sqlx(sqlx::Error::PoolClosed).is_connectivity());
        assert!(DbError::Timeout { after: Duration::from_secs(5) }.is_connectivity());
        assert!(!DbError::Sqlx(sqlx::Error::RowNotFound).is_connectivity());
        assert!(!DbError::Conflict { resource: "lead" }.is_connectivity());
    }
}
