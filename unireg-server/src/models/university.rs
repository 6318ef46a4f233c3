//! University documents
//!
//! Universities are seeded once and read-only afterwards. Nested
//! course/placement/contact data is kept as a document, not normalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ObjectId, ValidationError};

/// Longest search term accepted, counted after trimming
const MAX_SEARCH_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRange {
    pub min: i64,
    pub max: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub name: String,
    pub duration: String,
    pub fee_range: FeeRange,
    #[serde(default)]
    pub intake_months: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placements {
    pub avg_package: String,
    #[serde(default)]
    pub top_recruiters: Vec<String>,
    pub placement_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    pub email: String,
}

/// Descriptive content of a university, without identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityProfile {
    pub name: String,
    pub short_name: String,
    pub city: String,
    pub overview: String,
    #[serde(default)]
    pub courses: Vec<Course>,
    pub placements: Option<Placements>,
    #[serde(default)]
    pub facilities: Vec<String>,
    pub contact: Option<Contact>,
}

/// Stored university document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct University {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(flatten)]
    pub profile: UniversityProfile,
    pub created_at: DateTime<Utc>,
}

impl University {
    pub fn summary(&self) -> UniversitySummary {
        UniversitySummary {
            id: self.id.clone(),
            name: self.profile.name.clone(),
            short_name: self.profile.short_name.clone(),
            city: self.profile.city.clone(),
        }
    }
}

/// List projection: identity plus the fields shown in search results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversitySummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub short_name: String,
    pub city: String,
}

/// Case-insensitive substring search over name, city and short name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniversityFilter {
    search: Option<String>,
}

impl UniversityFilter {
    /// Blank search terms mean "no filter".
    pub fn new(search: Option<&str>) -> Result<Self, ValidationError> {
        let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::default());
        };
        if term.chars().count() > MAX_SEARCH_LEN {
            return Err(ValidationError::TooLong {
                field: "search",
                max: MAX_SEARCH_LEN,
            });
        }
        Ok(Self {
            search: Some(term.to_owned()),
        })
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// In-memory equivalent of the SQL `ILIKE` filter.
    pub fn matches(&self, profile: &UniversityProfile) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let term = term.to_lowercase();
        [&profile.name, &profile.city, &profile.short_name]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }

    /// `ILIKE` pattern with `%`, `_` and `\` escaped so the term matches literally.
    pub fn like_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for c in term.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}
