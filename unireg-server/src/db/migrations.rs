//! Schema migrations, idempotent and run on every fresh connection

use sqlx::PgPool;

use super::DbError;

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::debug!("Running schema migrations...");

    // Universities keep nested course/placement/contact data as documents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS universities (
            id TEXT PRIMARY KEY CHECK (id ~ '^[0-9a-f]{24}$'),
            name TEXT NOT NULL,
            short_name TEXT NOT NULL,
            city TEXT NOT NULL,
            overview TEXT NOT NULL DEFAULT '',
            courses JSONB NOT NULL DEFAULT '[]'::jsonb,
            placements JSONB,
            facilities JSONB NOT NULL DEFAULT '[]'::jsonb,
            contact JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // (email, phone) uniqueness is the storage-level dedupe for leads
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY CHECK (id ~ '^[0-9a-f]{24}$'),
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            state TEXT,
            course_interested TEXT NOT NULL,
            intake_year TEXT NOT NULL,
            consent BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT leads_email_phone_key UNIQUE (email, phone)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_universities_created ON universities(created_at)")
        .execute(pool)
        .await?;

    tracing::debug!("Schema migrations complete");
    Ok(())
}
