use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Error as SqlxError, FromRow};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::store::{NoteStore, StoreError};
use crate::models::{Note, NoteVersion, VersionOrigin};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS notes (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS note_versions (
        seq BIGSERIAL PRIMARY KEY,
        id UUID NOT NULL UNIQUE,
        note_id UUID NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        origin TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS note_versions_note_created_idx
        ON note_versions (note_id, created_at DESC, seq DESC)
    "#,
];

/// Note row from database
#[derive(Debug, Clone, FromRow)]
struct NoteRow {
    id: Uuid,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            id: row.id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Note version row from database
#[derive(Debug, Clone, FromRow)]
struct NoteVersionRow {
    id: Uuid,
    note_id: Uuid,
    content: String,
    origin: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<NoteVersionRow> for NoteVersion {
    type Error = SqlxError;

    fn try_from(row: NoteVersionRow) -> Result<Self, Self::Error> {
        let origin: VersionOrigin = row
            .origin
            .parse()
            .map_err(|e: String| SqlxError::Decode(e.into()))?;
        Ok(NoteVersion {
            id: row.id,
            note_id: row.note_id,
            content: row.content,
            origin,
            created_at: row.created_at,
        })
    }
}

/// Postgres backed note store
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn new(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Create the tables if they are missing
    pub async fn ensure_schema(&self) -> Result<(), SqlxError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }

    fn log_pool_state(&self, action: &str, note_id: Uuid) {
        let pool_idle = self.pool.num_idle() as u32;
        let pool_size = self.pool.size();
        debug!(
            "{} for note {}. Pool connections: {} idle, {} in use",
            action,
            note_id,
            pool_idle,
            pool_size.saturating_sub(pool_idle)
        );
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn create_note(&self, title: &str) -> Result<Note, StoreError> {
        let id = Uuid::new_v4();
        self.log_pool_state("Creating note", id);

        let query_sql = r#"
            INSERT INTO notes (id, title, content)
            VALUES ($1, $2, '')
            RETURNING id, title, content, created_at, updated_at;
        "#;
        let row = sqlx::query_as::<_, NoteRow>(query_sql)
            .bind(id)
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to create note '{}': {}", title, e);
                e
            })?;

        info!("Note created: {}", row.id);
        Ok(row.into())
    }

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        self.log_pool_state("Loading note", id);

        let query_sql = r#"
            SELECT id, title, content, created_at, updated_at
            FROM notes
            WHERE id = $1;
        "#;
        let row = sqlx::query_as::<_, NoteRow>(query_sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Note::from))
    }

    async fn update_note_content(&self, id: Uuid, content: &str) -> Result<Option<Note>, StoreError> {
        self.log_pool_state("Updating note", id);

        // Single statement, so the read-modify-write is atomic per note
        let query_sql = r#"
            UPDATE notes
            SET content = $1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING id, title, content, created_at, updated_at;
        "#;
        let row = sqlx::query_as::<_, NoteRow>(query_sql)
            .bind(content)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if row.is_none() {
            error!("Note not found for update: {}", id);
        }
        Ok(row.map(Note::from))
    }

    async fn append_version(
        &self,
        note_id: Uuid,
        content: &str,
        origin: VersionOrigin,
    ) -> Result<NoteVersion, StoreError> {
        self.log_pool_state("Appending version", note_id);

        let query_sql = r#"
            INSERT INTO note_versions (id, note_id, content, origin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, note_id, content, origin, created_at;
        "#;
        let row = sqlx::query_as::<_, NoteVersionRow>(query_sql)
            .bind(Uuid::new_v4())
            .bind(note_id)
            .bind(content)
            .bind(origin.as_str())
            .fetch_one(&self.pool)
            .await?;

        debug!("Version {} ({}) saved for note {}", row.id, origin, note_id);
        Ok(NoteVersion::try_from(row)?)
    }

    async fn list_versions(&self, note_id: Uuid, limit: usize) -> Result<Vec<NoteVersion>, StoreError> {
        let query_sql = r#"
            SELECT id, note_id, content, origin, created_at
            FROM note_versions
            WHERE note_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2;
        "#;
        let rows = sqlx::query_as::<_, NoteVersionRow>(query_sql)
            .bind(note_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let versions = rows
            .into_iter()
            .map(NoteVersion::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(versions)
    }
}
