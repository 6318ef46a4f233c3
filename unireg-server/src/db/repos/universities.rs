//! University repository
//!
//! - list: ILIKE search over name/city/short_name, summary projection
//! - get: full document by id
//! - replace_all: seeding, one transaction

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};

use crate::db::DbError;
use crate::models::{
    Contact, Course, ObjectId, Paginated, Pagination, Placements, University, UniversityFilter,
    UniversityProfile, UniversitySummary,
};

const UNIVERSITY_COLUMNS: &str =
    "id, name, short_name, city, overview, courses, placements, facilities, contact, created_at";

/// University row with JSONB document columns
#[derive(Debug, FromRow)]
struct UniversityRow {
    id: String,
    name: String,
    short_name: String,
    city: String,
    overview: String,
    courses: Json<Vec<Course>>,
    placements: Option<Json<Placements>>,
    facilities: Json<Vec<String>>,
    contact: Option<Json<Contact>>,
    created_at: DateTime<Utc>,
}

impl From<UniversityRow> for University {
    fn from(r: UniversityRow) -> Self {
        Self {
            id: ObjectId::from_db(r.id),
            profile: UniversityProfile {
                name: r.name,
                short_name: r.short_name,
                city: r.city,
                overview: r.overview,
                courses: r.courses.0,
                placements: r.placements.map(|p| p.0),
                facilities: r.facilities.0,
                contact: r.contact.map(|c| c.0),
            },
            created_at: r.created_at,
        }
    }
}

/// University repository
pub struct UniversityRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UniversityRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List university summaries, oldest first.
    ///
    /// The total is counted separately so pages past the end still report it.
    pub async fn list(
        &self,
        filter: &UniversityFilter,
        page: Pagination,
    ) -> Result<Paginated<UniversitySummary>, DbError> {
        let pattern = filter.like_pattern();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM universities
            WHERE $1::text IS NULL
               OR name ILIKE $1
               OR city ILIKE $1
               OR short_name ILIKE $1
            "#,
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, short_name, city
            FROM universities
            WHERE $1::text IS NULL
               OR name ILIKE $1
               OR city ILIKE $1
               OR short_name ILIKE $1
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| UniversitySummary {
                id: ObjectId::from_db(r.get("id")),
                name: r.get("name"),
                short_name: r.get("short_name"),
                city: r.get("city"),
            })
            .collect();

        Ok(Paginated {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Get a single university document by id.
    pub async fn get(&self, id: &ObjectId) -> Result<University, DbError> {
        let row: UniversityRow = sqlx::query_as(&format!(
            "SELECT {UNIVERSITY_COLUMNS} FROM universities WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "university",
            id: id.to_string(),
        })?;

        Ok(row.into())
    }

    /// Delete every university and insert the given profiles with fresh ids.
    pub async fn replace_all(
        &self,
        profiles: &[UniversityProfile],
    ) -> Result<Vec<University>, DbError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM universities")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tracing::info!(deleted, "Cleared existing universities");

        let mut inserted = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let row: UniversityRow = sqlx::query_as(&format!(
                r#"
                INSERT INTO universities
                    (id, name, short_name, city, overview, courses, placements, facilities, contact)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {UNIVERSITY_COLUMNS}
                "#
            ))
            .bind(ObjectId::generate().as_str())
            .bind(&profile.name)
            .bind(&profile.short_name)
            .bind(&profile.city)
            .bind(&profile.overview)
            .bind(Json(&profile.courses))
            .bind(profile.placements.as_ref().map(Json))
            .bind(Json(&profile.facilities))
            .bind(profile.contact.as_ref().map(Json))
            .fetch_one(&mut *tx)
            .await?;

            inserted.push(University::from(row));
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
