//! Document identifiers
//!
//! 12 bytes rendered as 24 lowercase hex characters:
//! 4-byte big-endian unix seconds, 5 random bytes per process,
//! 3-byte big-endian counter.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

static OBJECT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("invalid object id regex"));

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(rand::random);

static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(rand::random()));

/// Validated 24-character hex identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        let secs = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        Self(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Parse an identifier from user input.
    ///
    /// # Example
    /// ```
    /// use unireg_server::models::ObjectId;
    ///
    /// assert!(ObjectId::parse("64F1A2B3C4D5E6F708192A3B").is_ok());
    /// assert!(ObjectId::parse("not-an-id").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !OBJECT_ID_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "id",
                reason: "Invalid university ID",
            });
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Wrap an identifier read back from the database.
    pub(crate) fn from_db(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}
