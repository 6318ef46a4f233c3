//! Lead repository
//!
//! Inserts rely on the (email, phone) unique constraint:
//! `ON CONFLICT DO NOTHING` returns no row for a duplicate.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::db::DbError;
use crate::models::{Lead, NewLead, ObjectId};

/// Lead record from database
#[derive(Debug, FromRow)]
struct LeadRow {
    id: String,
    full_name: String,
    email: String,
    phone: String,
    state: Option<String>,
    course_interested: String,
    intake_year: String,
    consent: bool,
    created_at: DateTime<Utc>,
}

impl From<LeadRow> for Lead {
    fn from(r: LeadRow) -> Self {
        Self {
            id: ObjectId::from_db(r.id),
            full_name: r.full_name,
            email: r.email,
            phone: r.phone,
            state: r.state,
            course_interested: r.course_interested,
            intake_year: r.intake_year,
            consent: r.consent,
            created_at: r.created_at,
        }
    }
}

/// Lead repository
pub struct LeadRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> LeadRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a lead, or `DbError::Conflict` if the (email, phone) pair exists.
    pub async fn insert(&self, lead: &NewLead) -> Result<Lead, DbError> {
        let row: Option<LeadRow> = sqlx::query_as(
            r#"
            INSERT INTO leads
                (id, full_name, email, phone, state, course_interested, intake_year, consent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT ON CONSTRAINT leads_email_phone_key DO NOTHING
            RETURNING id, full_name, email, phone, state, course_interested,
                      intake_year, consent, created_at
            "#,
        )
        .bind(ObjectId::generate().as_str())
        .bind(&lead.full_name)
        .bind(lead.email.as_str())
        .bind(lead.phone.as_str())
        .bind(lead.state.as_deref())
        .bind(&lead.course_interested)
        .bind(&lead.intake_year)
        .bind(lead.consent)
        .fetch_optional(self.pool)
        .await?;

        row.map(Lead::from)
            .ok_or(DbError::Conflict { resource: "lead" })
    }
}
