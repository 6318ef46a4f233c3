//! Connection manager - lifecycle of the shared database handle
//!
//! ```text
//!   Disconnected ──► Connecting ──► Connected
//!        ▲               │              │ stale handle / query hit an I/O error
//!        │               ▼              ▼
//!        └──────── Unavailable    Disconnected
//!         (cooldown)
//! ```
//!
//! - The handle is connected lazily and reused while it reports healthy.
//! - Attempts are serialized: one in flight, concurrent callers wait for it.
//! - Each failed attempt bumps a counter; past `max_retries` the store is
//!   `Unavailable` until `cooldown` elapses, then the counter resets.
//! - An attempt always runs to completion, even if every caller waiting
//!   on it has gone away.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::time::{sleep, timeout, Instant};

use crate::config::RetryPolicy;
use crate::db::{DbError, Store};

/// Lifecycle state of the shared handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Unavailable,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens new store handles
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Store>, DbError>;
}

struct Slot {
    handle: Option<Arc<dyn Store>>,
    failures: u32,
    unavailable_until: Option<Instant>,
}

/// State owned jointly by the manager and any in-flight connect task
struct Shared {
    connector: Box<dyn Connector>,
    policy: RetryPolicy,
    /// Held for the whole connect attempt, which makes attempts single-flight
    slot: Mutex<Slot>,
    state: watch::Sender<ConnectionState>,
}

/// Owns the process-wide database handle.
///
/// Shared through `AppState`; there is no global instance. Connect attempts
/// run on their own task, so a caller that goes away (request timeout,
/// client disconnect) never leaves the state machine half way through.
pub struct ConnectionManager {
    shared: Arc<Shared>,
    /// How long one caller waits for an attempt before giving up on it
    caller_wait: Option<Duration>,
}

impl ConnectionManager {
    pub fn new(connector: impl Connector + 'static, policy: RetryPolicy) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                connector: Box::new(connector),
                policy,
                slot: Mutex::new(Slot {
                    handle: None,
                    failures: 0,
                    unavailable_until: None,
                }),
                state,
            }),
            caller_wait: None,
        }
    }

    /// Bound the time a caller spends waiting on a connect attempt.
    ///
    /// A caller that runs out of time gets `None`; the attempt itself keeps
    /// going and its outcome is cached for later callers.
    pub fn with_caller_wait(mut self, wait: Duration) -> Self {
        self.caller_wait = Some(wait);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.shared.policy
    }

    /// Current state. Never connects.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Make sure a usable handle exists, connecting if needed.
    pub async fn ensure_connected(&self) -> ConnectionState {
        match self.acquire().await {
            Some(_) => ConnectionState::Connected,
            None => self.state(),
        }
    }

    /// The cached handle, if one exists. Never connects.
    pub async fn handle(&self) -> Option<Arc<dyn Store>> {
        self.shared.slot.lock().await.handle.clone()
    }

    /// Healthy handle, connecting (with bounded retries) if there is none.
    ///
    /// Returns `None` while the store is unavailable, or when the caller's
    /// wait ran out before the attempt finished.
    pub async fn acquire(&self) -> Option<Arc<dyn Store>> {
        if let Ok(slot) = self.shared.slot.try_lock() {
            if let Some(handle) = slot.handle.as_ref().filter(|h| h.is_healthy()) {
                return Some(Arc::clone(handle));
            }
        }

        let shared = Arc::clone(&self.shared);
        let attempt = tokio::spawn(async move { shared.acquire().await });

        let joined = match self.caller_wait {
            Some(wait) => match timeout(wait, attempt).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(
                        wait_secs = wait.as_secs_f64(),
                        "Stopped waiting for the database, attempt continues in the background"
                    );
                    return None;
                }
            },
            None => attempt.await,
        };

        joined.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Database connect task failed");
            None
        })
    }

    /// A query on `handle` failed because the store is unreachable.
    ///
    /// Drops the cached handle if it is still the same one, so the next
    /// request reconnects.
    pub async fn report_failure(&self, handle: &Arc<dyn Store>) {
        let mut slot = self.shared.slot.lock().await;
        let is_current = slot
            .handle
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, handle));

        if is_current {
            tracing::warn!("Dropping database handle after a connectivity error");
            slot.handle = None;
            self.shared.transition(ConnectionState::Disconnected);
        }
    }

    /// Close the cached handle (shutdown).
    pub async fn close(&self) {
        let handle = self.shared.slot.lock().await.handle.take();
        if let Some(handle) = handle {
            handle.close().await;
        }
        self.shared.transition(ConnectionState::Disconnected);
    }
}

impl Shared {
    async fn acquire(&self) -> Option<Arc<dyn Store>> {
        let mut slot = self.slot.lock().await;

        if let Some(handle) = &slot.handle {
            if handle.is_healthy() {
                return Some(Arc::clone(handle));
            }
            tracing::warn!("Cached database handle is no longer healthy, dropping it");
            slot.handle = None;
            self.transition(ConnectionState::Disconnected);
        }

        if let Some(until) = slot.unavailable_until {
            if Instant::now() < until {
                return None;
            }
            tracing::info!("Retry window elapsed, resetting retry counter");
            slot.unavailable_until = None;
            slot.failures = 0;
            self.transition(ConnectionState::Disconnected);
        }

        self.transition(ConnectionState::Connecting);
        loop {
            let attempt = slot.failures + 1;
            let result = timeout(self.policy.connect_timeout, self.connector.connect())
                .await
                .unwrap_or(Err(DbError::Timeout {
                    after: self.policy.connect_timeout,
                }));

            match result {
                Ok(handle) => {
                    tracing::info!(attempt, "Database connected");
                    slot.failures = 0;
                    slot.handle = Some(Arc::clone(&handle));
                    self.transition(ConnectionState::Connected);
                    return Some(handle);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Database connection attempt failed");
                }
            }

            slot.failures = attempt;
            if slot.failures > self.policy.max_retries {
                tracing::error!(
                    attempts = slot.failures,
                    cooldown_secs = self.policy.cooldown.as_secs(),
                    "Database unavailable, serving without it until the cooldown elapses"
                );
                slot.unavailable_until = Some(Instant::now() + self.policy.cooldown);
                self.transition(ConnectionState::Unavailable);
                return None;
            }

            sleep(self.policy.retry_delay * slot.failures).await;
        }
    }

    fn transition(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::debug!(from = %prev, to = %next, "Connection state changed");
        }
    }
}
