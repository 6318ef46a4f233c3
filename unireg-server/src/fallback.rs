//! Fallback resolver - read paths that survive a missing database
//!
//! When the connection manager has no usable handle, university reads are
//! answered from a static dataset instead of failing. Every answer carries
//! a [`Source`] tag so clients can tell live data from substitute data.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog;
use crate::connection::ConnectionManager;
use crate::db::{DbError, Store};
use crate::models::{
    ObjectId, Paginated, Pagination, University, UniversityFilter, UniversitySummary,
};

/// Where a response's data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Database,
    Fallback,
}

/// Data plus its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub data: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    fn database(data: T) -> Self {
        Self {
            data,
            source: Source::Database,
        }
    }

    fn fallback(data: T) -> Self {
        Self {
            data,
            source: Source::Fallback,
        }
    }
}

/// Static substitute for the university collection
#[derive(Debug, Clone)]
pub struct FallbackDataset {
    universities: Vec<University>,
}

impl FallbackDataset {
    pub fn new(universities: Vec<University>) -> Self {
        Self { universities }
    }

    /// The sample catalog under stable ids `000…001`, `000…002`, ...
    pub fn builtin() -> Self {
        let universities = catalog::sample_universities()
            .into_iter()
            .enumerate()
            .map(|(i, profile)| University {
                id: ObjectId::from_db(format!("{:024x}", i + 1)),
                profile,
                created_at: DateTime::<Utc>::UNIX_EPOCH,
            })
            .collect();
        Self::new(universities)
    }

    pub fn is_empty(&self) -> bool {
        self.universities.is_empty()
    }

    pub fn list(
        &self,
        filter: &UniversityFilter,
        page: Pagination,
    ) -> Paginated<UniversitySummary> {
        let matching: Vec<UniversitySummary> = self
            .universities
            .iter()
            .filter(|u| filter.matches(&u.profile))
            .map(University::summary)
            .collect();
        page.slice(&matching)
    }

    pub fn get(&self, id: &ObjectId) -> Option<&University> {
        self.universities.iter().find(|u| &u.id == id)
    }
}

impl Default for FallbackDataset {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Routes university reads to the database or the fallback dataset
#[derive(Clone)]
pub struct FallbackResolver {
    connections: Arc<ConnectionManager>,
    dataset: Arc<FallbackDataset>,
}

impl FallbackResolver {
    pub fn new(connections: Arc<ConnectionManager>, dataset: Arc<FallbackDataset>) -> Self {
        Self {
            connections,
            dataset,
        }
    }

    pub fn dataset(&self) -> &FallbackDataset {
        &self.dataset
    }

    /// Page of university summaries.
    pub async fn list_universities(
        &self,
        filter: &UniversityFilter,
        page: Pagination,
    ) -> Result<Resolved<Paginated<UniversitySummary>>, DbError> {
        self.resolve(
            |store| async move { store.list_universities(filter, page).await },
            |dataset| Ok(dataset.list(filter, page)),
        )
        .await
    }

    /// One university; `DbError::NotFound` when neither source has it.
    pub async fn get_university(&self, id: &ObjectId) -> Result<Resolved<University>, DbError> {
        self.resolve(
            |store| async move { store.get_university(id).await },
            |dataset| {
                dataset.get(id).cloned().ok_or_else(|| DbError::NotFound {
                    resource: "university",
                    id: id.to_string(),
                })
            },
        )
        .await
    }

    async fn resolve<T, F, Fut>(
        &self,
        live: F,
        fallback: impl FnOnce(&FallbackDataset) -> Result<T, DbError>,
    ) -> Result<Resolved<T>, DbError>
    where
        F: FnOnce(Arc<dyn Store>) -> Fut,
        Fut: Future<Output = Result<T, DbError>>,
    {
        let Some(store) = self.connections.acquire().await else {
            tracing::debug!(state = %self.connections.state(), "Serving fallback data");
            return fallback(self.dataset()).map(Resolved::fallback);
        };

        match live(Arc::clone(&store)).await {
            Ok(data) => Ok(Resolved::database(data)),
            Err(e) if e.is_connectivity() => {
                tracing::warn!(error = %e, "Database unreachable mid-request, serving fallback data");
                self.connections.report_failure(&store).await;
                fallback(self.dataset()).map(Resolved::fallback)
            }
            Err(e) => Err(e),
        }
    }
}
