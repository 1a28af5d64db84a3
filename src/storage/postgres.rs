//! Postgres storage

use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::notes::Note;
use crate::notes::Page;
use crate::notes::PageRequest;
use crate::notes::Priority;
use crate::users::User;
use crate::utils::env_var;

use super::CreateUserValues;
use super::Error;
use super::Result;
use super::Storage;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres type for note priority
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "note_priority_type")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
enum NotePriorityType {
    /// Now
    Now,

    /// Later
    Later,

    /// Someday
    Someday,

    /// Done
    Done,
}

impl NotePriorityType {
    /// Create note priority type from priority
    fn from_priority(priority: Priority) -> Self {
        match priority {
            Priority::Now => NotePriorityType::Now,
            Priority::Later => NotePriorityType::Later,
            Priority::Someday => NotePriorityType::Someday,
            Priority::Done => NotePriorityType::Done,
        }
    }

    /// Create priority from note priority type
    fn to_priority(&self) -> Priority {
        match self {
            NotePriorityType::Now => Priority::Now,
            NotePriorityType::Later => Priority::Later,
            NotePriorityType::Someday => Priority::Someday,
            NotePriorityType::Done => Priority::Done,
        }
    }
}

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> anyhow::Result<Self> {
        let database_connection_string =
            env_var("DATABASE_URL").context("`DATABASE_URL` is required")?;

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .context("Could not connect to the database")?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> anyhow::Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .context("Migrations could not run")?;

        Ok(Self { connection_pool })
    }

    /// Wrap a page of Postgres notes
    fn page(notes: Vec<PostgresNote>, total: i64, page: &PageRequest) -> Page<Note> {
        Page {
            items: Note::from_postgres_note_multiple(notes),
            total_pages: page.total_pages(u64::try_from(total).unwrap_or_default()),
            page_number: page.page,
        }
    }
}

/// Postgres version of note
struct PostgresNote {
    /// Note ID
    id: Uuid,

    /// Owner of the note
    owner_id: String,

    /// Title
    title: String,

    /// Content
    content: String,

    /// Priority
    priority: NotePriorityType,

    /// Creation date
    created_at: NaiveDateTime,

    /// Last updated at
    updated_at: NaiveDateTime,

    /// Deleted at
    deleted_at: Option<NaiveDateTime>,
}

impl Note {
    /// Create note from postgres version
    fn from_postgres_note(note: PostgresNote) -> Self {
        Self {
            id: note.id,
            owner_id: note.owner_id,
            title: note.title,
            content: note.content,
            priority: note.priority.to_priority(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            deleted_at: note.deleted_at,
        }
    }

    /// Maybe create note from postgres version
    fn from_postgres_note_optional(note: Option<PostgresNote>) -> Option<Self> {
        note.map(Self::from_postgres_note)
    }

    /// Create multiple notes from postgres version
    fn from_postgres_note_multiple(notes: Vec<PostgresNote>) -> Vec<Self> {
        notes.into_iter().map(Self::from_postgres_note).collect()
    }
}

/// Page parameters as Postgres wants them
fn limit_and_offset(page: &PageRequest) -> (i64, i64) {
    (
        i64::from(page.size),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

impl Storage for Postgres {
    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT id, username, hashed_password
            FROM users
            WHERE username = $1
            LIMIT 1
            "#,
            username,
        )
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT id, username, hashed_password
            FROM users
            WHERE id = $1
            LIMIT 1
            "#,
            id,
        )
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as!(
            User,
            r#"
            INSERT INTO users (id, username, hashed_password)
            VALUES ($1, $2, $3)
            RETURNING id, username, hashed_password
            "#,
            Uuid::new_v4(),
            values.username,
            values.hashed_password,
        )
        .fetch_one(&self.connection_pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref database_error) if database_error.is_unique_violation() => {
                Error::AlreadyExists
            }
            err => connection_error(err),
        })?;

        Ok(user)
    }

    async fn save_note(&self, note: &Note) -> Result<Note> {
        let saved_note = sqlx::query_as!(
            PostgresNote,
            r#"
            INSERT INTO notes
                (id, owner_id, title, content, priority, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                priority = EXCLUDED.priority,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
            RETURNING
                id,
                owner_id,
                title,
                content,
                priority AS "priority: NotePriorityType",
                created_at,
                updated_at,
                deleted_at
            "#,
            note.id,
            note.owner_id,
            note.title,
            note.content,
            NotePriorityType::from_priority(note.priority) as _,
            note.created_at,
            note.updated_at,
            note.deleted_at,
        )
        .fetch_one(&self.connection_pool)
        .await
        .map(Note::from_postgres_note)
        .map_err(connection_error)?;

        Ok(saved_note)
    }

    async fn find_single_active_note(&self, owner_id: &str, id: &Uuid) -> Result<Option<Note>> {
        let note = sqlx::query_as!(
            PostgresNote,
            r#"
            SELECT
                id,
                owner_id,
                title,
                content,
                priority AS "priority: NotePriorityType",
                created_at,
                updated_at,
                deleted_at
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1 AND id = $2
            LIMIT 1
            "#,
            owner_id,
            id,
        )
        .fetch_optional(&self.connection_pool)
        .await
        .map(Note::from_postgres_note_optional)
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn find_page_of_active_notes(
        &self,
        owner_id: &str,
        page: &PageRequest,
    ) -> Result<Page<Note>> {
        let (limit, offset) = limit_and_offset(page);

        let total = sqlx::query_scalar!(
            r#"
            SELECT COUNT(*) AS "count!"
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1
            "#,
            owner_id,
        )
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let notes = sqlx::query_as!(
            PostgresNote,
            r#"
            SELECT
                id,
                owner_id,
                title,
                content,
                priority AS "priority: NotePriorityType",
                created_at,
                updated_at,
                deleted_at
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1
            ORDER BY created_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
            owner_id,
            limit,
            offset,
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(Self::page(notes, total, page))
    }

    async fn find_page_of_active_notes_by_priority(
        &self,
        owner_id: &str,
        priority: Priority,
        page: &PageRequest,
    ) -> Result<Page<Note>> {
        let (limit, offset) = limit_and_offset(page);

        let total = sqlx::query_scalar!(
            r#"
            SELECT COUNT(*) AS "count!"
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1 AND priority = $2
            "#,
            owner_id,
            NotePriorityType::from_priority(priority) as _,
        )
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let notes = sqlx::query_as!(
            PostgresNote,
            r#"
            SELECT
                id,
                owner_id,
                title,
                content,
                priority AS "priority: NotePriorityType",
                created_at,
                updated_at,
                deleted_at
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1 AND priority = $2
            ORDER BY created_at DESC, id ASC
            LIMIT $3 OFFSET $4
            "#,
            owner_id,
            NotePriorityType::from_priority(priority) as _,
            limit,
            offset,
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(Self::page(notes, total, page))
    }

    async fn find_page_of_active_notes_created_after(
        &self,
        owner_id: &str,
        threshold: &NaiveDateTime,
        page: &PageRequest,
    ) -> Result<Page<Note>> {
        let (limit, offset) = limit_and_offset(page);

        let total = sqlx::query_scalar!(
            r#"
            SELECT COUNT(*) AS "count!"
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1 AND created_at >= $2
            "#,
            owner_id,
            threshold,
        )
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let notes = sqlx::query_as!(
            PostgresNote,
            r#"
            SELECT
                id,
                owner_id,
                title,
                content,
                priority AS "priority: NotePriorityType",
                created_at,
                updated_at,
                deleted_at
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1 AND created_at >= $2
            ORDER BY created_at DESC, id ASC
            LIMIT $3 OFFSET $4
            "#,
            owner_id,
            threshold,
            limit,
            offset,
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(Self::page(notes, total, page))
    }

    async fn find_active_notes_updated_before_excluding_priority(
        &self,
        owner_id: &str,
        threshold: &NaiveDateTime,
        excluded_priority: Priority,
    ) -> Result<Vec<Note>> {
        let notes = sqlx::query_as!(
            PostgresNote,
            r#"
            SELECT
                id,
                owner_id,
                title,
                content,
                priority AS "priority: NotePriorityType",
                created_at,
                updated_at,
                deleted_at
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1 AND updated_at < $2 AND priority <> $3
            "#,
            owner_id,
            threshold,
            NotePriorityType::from_priority(excluded_priority) as _,
        )
        .fetch_all(&self.connection_pool)
        .await
        .map(Note::from_postgres_note_multiple)
        .map_err(connection_error)?;

        Ok(notes)
    }

    async fn find_active_notes_by_priority(
        &self,
        owner_id: &str,
        priority: Priority,
    ) -> Result<Vec<Note>> {
        let notes = sqlx::query_as!(
            PostgresNote,
            r#"
            SELECT
                id,
                owner_id,
                title,
                content,
                priority AS "priority: NotePriorityType",
                created_at,
                updated_at,
                deleted_at
            FROM notes
            WHERE deleted_at IS NULL AND owner_id = $1 AND priority = $2
            "#,
            owner_id,
            NotePriorityType::from_priority(priority) as _,
        )
        .fetch_all(&self.connection_pool)
        .await
        .map(Note::from_postgres_note_multiple)
        .map_err(connection_error)?;

        Ok(notes)
    }

    async fn find_soft_deleted_notes(&self, owner_id: &str) -> Result<Vec<Note>> {
        let notes = sqlx::query_as!(
            PostgresNote,
            r#"
            SELECT
                id,
                owner_id,
                title,
                content,
                priority AS "priority: NotePriorityType",
                created_at,
                updated_at,
                deleted_at
            FROM notes
            WHERE deleted_at IS NOT NULL AND owner_id = $1
            "#,
            owner_id,
        )
        .fetch_all(&self.connection_pool)
        .await
        .map(Note::from_postgres_note_multiple)
        .map_err(connection_error)?;

        Ok(notes)
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    tracing::error!("Storage failure: {err}");

    Error::Connection(err.to_string())
}
