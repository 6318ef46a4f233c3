//! unireg-server: university directory and lead capture over HTTP
//!
//! The database handle is owned by a [`ConnectionManager`] that connects
//! lazily, reuses the handle across requests and retries with a bounded
//! counter. Read endpoints degrade to a static fallback dataset when the
//! store is unreachable; write endpoints report the outage instead.

pub mod catalog;
pub mod config;
pub mod connection;
pub mod db;
pub mod fallback;
pub mod http;
pub mod models;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testutils;

pub use config::{AppEnv, RetryPolicy, ServerConfig};
pub use connection::{ConnectionManager, ConnectionState, Connector};
pub use db::{DbError, PgConnector, PgStore, Store};
pub use fallback::{FallbackDataset, FallbackResolver, Resolved, Source};
pub use http::{build_router, run_server, ApiError, AppState, ServerError};
