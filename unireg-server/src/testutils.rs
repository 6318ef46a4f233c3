//! In-memory store, scripted connectors and HTTP helpers for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use chrono::Utc;

use crate::catalog;
use crate::config::{AppEnv, RetryPolicy, ServerConfig};
use crate::connection::{ConnectionManager, Connector};
use crate::http::{build_router, AppState};
use crate::db::{DbError, Store};
use crate::models::{
    Lead, NewLead, ObjectId, Paginated, Pagination, University, UniversityFilter,
    UniversityProfile, UniversitySummary,
};

#[derive(Default)]
struct Inner {
    unhealthy: AtomicBool,
    offline: AtomicBool,
    universities: Mutex<Vec<University>>,
    leads: Mutex<Vec<Lead>>,
}

/// Store backed by vectors. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store holding the sample catalog under freshly generated ids.
    pub fn seeded() -> Self {
        let store = Self::empty();
        *store.inner.universities.lock().unwrap() = catalog::sample_universities()
            .into_iter()
            .map(|profile| University {
                id: ObjectId::generate(),
                profile,
                created_at: Utc::now(),
            })
            .collect();
        store
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.inner.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    /// While offline every query fails with a connectivity error.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    pub fn universities(&self) -> Vec<University> {
        self.inner.universities.lock().unwrap().clone()
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.inner.leads.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<(), DbError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn is_healthy(&self) -> bool {
        !self.inner.unhealthy.load(Ordering::SeqCst)
    }

    async fn list_universities(
        &self,
        filter: &UniversityFilter,
        page: Pagination,
    ) -> Result<Paginated<UniversitySummary>, DbError> {
        self.check_online()?;
        let matching: Vec<UniversitySummary> = self
            .inner
            .universities
            .lock()
            .unwrap()
            .iter()
            .filter(|u| filter.matches(&u.profile))
            .map(University::summary)
            .collect();
        Ok(page.slice(&matching))
    }

    async fn get_university(&self, id: &ObjectId) -> Result<University, DbError> {
        self.check_online()?;
        self.inner
            .universities
            .lock()
            .unwrap()
            .iter()
            .find(|u| &u.id == id)
            .cloned()
            .ok_or_else(|| DbError::NotFound {
                resource: "university",
                id: id.to_string(),
            })
    }

    async fn insert_lead(&self, lead: &NewLead) -> Result<Lead, DbError> {
        self.check_online()?;
        let mut leads = self.inner.leads.lock().unwrap();
        let duplicate = leads
            .iter()
            .any(|l| l.email == lead.email.as_str() && l.phone == lead.phone.as_str());
        if duplicate {
            return Err(DbError::Conflict { resource: "lead" });
        }

        let stored = Lead {
            id: ObjectId::generate(),
            full_name: lead.full_name.clone(),
            email: lead.email.as_str().to_owned(),
            phone: lead.phone.as_str().to_owned(),
            state: lead.state.clone(),
            course_interested: lead.course_interested.clone(),
            intake_year: lead.intake_year.clone(),
            consent: lead.consent,
            created_at: Utc::now(),
        };
        leads.push(stored.clone());
        Ok(stored)
    }

    async fn replace_universities(
        &self,
        profiles: &[UniversityProfile],
    ) -> Result<Vec<University>, DbError> {
        self.check_online()?;
        let fresh: Vec<University> = profiles
            .iter()
            .cloned()
            .map(|profile| University {
                id: ObjectId::generate(),
                profile,
                created_at: Utc::now(),
            })
            .collect();
        *self.inner.universities.lock().unwrap() = fresh.clone();
        Ok(fresh)
    }

    async fn close(&self) {
        self.set_healthy(false);
    }
}

/// What a scripted connect attempt does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Fail,
    /// Never completes; only the connect timeout ends it
    Hang,
}

/// Shared view of how many times `connect` ran
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Connector that plays back a fixed list of outcomes, then repeats a default.
pub struct ScriptedConnector {
    store: MemoryStore,
    script: Mutex<VecDeque<Outcome>>,
    otherwise: Outcome,
    delay: Option<Duration>,
    calls: CallCounter,
}

impl ScriptedConnector {
    pub fn new(store: MemoryStore, script: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            store,
            script: Mutex::new(script.into_iter().collect()),
            otherwise: Outcome::Ok,
            delay: None,
            calls: CallCounter::default(),
        }
    }

    pub fn always_ok(store: MemoryStore) -> Self {
        Self::new(store, [])
    }

    pub fn always_fail() -> Self {
        Self {
            otherwise: Outcome::Fail,
            ..Self::new(MemoryStore::empty(), [])
        }
    }

    /// Every attempt takes `delay` before resolving.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Arc<dyn Store>, DbError> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.otherwise);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match outcome {
            Outcome::Ok => Ok(Arc::new(self.store.clone())),
            Outcome::Fail => Err(DbError::Sqlx(sqlx::Error::PoolTimedOut)),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

/// Policy that gives up at once so outage tests stay fast.
pub fn impatient_policy() -> RetryPolicy {
    RetryPolicy {
        connect_timeout: Duration::from_millis(100),
        max_retries: 0,
        retry_delay: Duration::from_millis(1),
        cooldown: Duration::from_secs(60),
    }
}

/// Router wired to `connector`, plus the manager behind it.
pub fn test_app(connector: ScriptedConnector) -> (Router, Arc<ConnectionManager>) {
    app_for(ConnectionManager::new(connector, impatient_policy()))
}

/// Router around an already configured manager.
pub fn app_for(manager: ConnectionManager) -> (Router, Arc<ConnectionManager>) {
    let connections = Arc::new(manager);
    let state = Arc::new(AppState::new(Arc::clone(&connections), AppEnv::default()));
    let router = build_router(state, &ServerConfig::default()).unwrap();
    (router, connections)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
