//! Lead submission validation
//!
//! A lead is accepted only when every required field is present,
//! the email looks like an address and the phone is exactly 10 digits.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{ObjectId, ValidationError};

/// Upper bound for free-text lead fields
const MAX_FIELD_LEN: usize = 200;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

/// ASCII digits only; `\d` would admit other Unicode digits
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("invalid phone regex"));

/// Normalized email address (trimmed, lowercase)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    /// # Example
    /// ```
    /// use unireg_server::models::Email;
    ///
    /// let email = Email::new("  Student@Example.COM ").unwrap();
    /// assert_eq!(email.as_str(), "student@example.com");
    /// assert!(Email::new("no-at-sign.com").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.chars().count() > MAX_FIELD_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_FIELD_LEN,
            });
        }

        if !EMAIL_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "Invalid email format",
            });
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ten-digit phone number, stored exactly as submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phone(String);

impl Phone {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if !PHONE_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "phone",
                reason: "Phone must be exactly 10 digits",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Intake year as sent by the form: either `"2025"` or `2025`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IntakeYear {
    Number(i64),
    Text(String),
}

impl IntakeYear {
    fn normalized(&self) -> Option<String> {
        match self {
            Self::Number(0) => None,
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_owned())
            }
        }
    }
}

/// Phone as sent by the form: `"9876543210"` or `9876543210`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PhoneInput {
    Number(u64),
    Text(String),
}

impl PhoneInput {
    fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Number(n) => Some(Cow::Owned(n.to_string())),
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(Cow::Borrowed(s)),
        }
    }
}

impl From<&str> for PhoneInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Checkbox-style flag: `null`, `false`, `0` and `""` are false, anything else is true.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    })
}

/// Raw body of `POST /api/leads`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<PhoneInput>,
    pub state: Option<String>,
    pub course_interested: Option<String>,
    pub intake_year: Option<IntakeYear>,
    #[serde(default, deserialize_with = "truthy")]
    pub consent: bool,
    /// Optional webhook that receives a copy of the created lead
    pub pipedream_url: Option<String>,
}

/// Validated lead ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub full_name: String,
    pub email: Email,
    pub phone: Phone,
    pub state: Option<String>,
    pub course_interested: String,
    pub intake_year: String,
    pub consent: bool,
}

impl LeadSubmission {
    /// Validate and normalize the submission.
    ///
    /// # Rules
    /// - fullName, email, phone, courseInterested, intakeYear are required
    /// - email is trimmed and lowercased before matching `local@domain.tld`
    /// - phone must be exactly 10 ASCII digits, no trimming; a JSON number is
    ///   checked on its decimal form
    /// - consent follows checkbox truthiness and defaults to false
    pub fn validate(&self) -> Result<NewLead, ValidationError> {
        let full_name = present(&self.full_name);
        let email = present(&self.email);
        let phone = self.phone.as_ref().and_then(PhoneInput::as_text);
        let course = present(&self.course_interested);
        let intake_year = self.intake_year.as_ref().and_then(IntakeYear::normalized);

        let mut missing = Vec::new();
        if full_name.is_none() {
            missing.push("fullName");
        }
        if email.is_none() {
            missing.push("email");
        }
        if phone.is_none() {
            missing.push("phone");
        }
        if course.is_none() {
            missing.push("courseInterested");
        }
        if intake_year.is_none() {
            missing.push("intakeYear");
        }

        let (Some(full_name), Some(email), Some(phone), Some(course), Some(intake_year)) =
            (full_name, email, phone, course, intake_year)
        else {
            return Err(ValidationError::Missing { fields: missing });
        };

        let email = Email::new(email)?;
        let phone = Phone::new(&phone)?;

        Ok(NewLead {
            full_name: bounded("fullName", full_name)?,
            email,
            phone,
            state: present(&self.state)
                .map(|s| bounded("state", s))
                .transpose()?,
            course_interested: bounded("courseInterested", course)?,
            intake_year,
            consent: self.consent,
        })
    }
}

/// Trimmed value of an optional field, `None` when absent or blank
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn bounded(field: &'static str, value: &str) -> Result<String, ValidationError> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_FIELD_LEN,
        });
    }
    Ok(value.to_owned())
}

/// Stored lead record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: ObjectId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub state: Option<String>,
    pub course_interested: String,
    pub intake_year: String,
    pub consent: bool,
    pub created_at: DateTime<Utc>,
}
