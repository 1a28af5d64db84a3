//! All things related to the storage of users and notes

use core::fmt;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::notes::Note;
use crate::notes::Page;
use crate::notes::PageRequest;
use crate::notes::Priority;
use crate::users::User;

#[cfg(not(feature = "postgres"))]
pub use memory::Memory;
#[cfg(feature = "postgres")]
pub use postgres::Postgres;

#[cfg(all(test, not(feature = "postgres")))]
pub mod failing;
#[cfg(not(feature = "postgres"))]
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> anyhow::Result<Memory> {
    tracing::info!("Using in-memory storage, data is lost on shutdown");

    Ok(Memory::new())
}

/// Setup the storage
///
/// Uses the `DATABASE_URL` environment variable
#[cfg(feature = "postgres")]
pub async fn setup() -> anyhow::Result<Postgres> {
    Postgres::new().await
}

/// Storage errors
#[derive(Debug)]
pub enum Error {
    /// A connection error with the storage
    #[cfg_attr(not(any(test, feature = "postgres")), allow(dead_code))]
    Connection(String),

    /// A unique value, like a username, is already taken
    AlreadyExists,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(error) => write!(f, "Connection error: {error}"),
            Error::AlreadyExists => write!(f, "Already exists"),
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The username
    pub username: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,
}

/// Storage with all supported operations
///
/// All note lookups are scoped to an owner, a note of another owner is never returned
pub trait Storage: Clone + Send + Sync + 'static {
    /// Finds a single user by its username
    fn find_single_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Finds a single user by its ID
    fn find_single_user_by_id(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Create a single user
    ///
    /// Fails with `AlreadyExists` when the username is taken
    fn create_user(
        &self,
        values: &CreateUserValues,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Insert a note, or overwrite the note with the same ID
    fn save_note(&self, note: &Note) -> impl Future<Output = Result<Note>> + Send;

    /// Find a single note of an owner
    ///
    /// Respects the soft-delete
    fn find_single_active_note(
        &self,
        owner_id: &str,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<Note>>> + Send;

    /// Find a page of notes of an owner, newest first
    ///
    /// Respects the soft-delete
    fn find_page_of_active_notes(
        &self,
        owner_id: &str,
        page: &PageRequest,
    ) -> impl Future<Output = Result<Page<Note>>> + Send;

    /// Find a page of notes of an owner with a specific priority, newest first
    ///
    /// Respects the soft-delete
    fn find_page_of_active_notes_by_priority(
        &self,
        owner_id: &str,
        priority: Priority,
        page: &PageRequest,
    ) -> impl Future<Output = Result<Page<Note>>> + Send;

    /// Find a page of notes of an owner created at or after `threshold`, newest first
    ///
    /// Respects the soft-delete
    fn find_page_of_active_notes_created_after(
        &self,
        owner_id: &str,
        threshold: &NaiveDateTime,
        page: &PageRequest,
    ) -> impl Future<Output = Result<Page<Note>>> + Send;

    /// Find all notes of an owner last updated before `threshold`, skipping a priority
    ///
    /// Respects the soft-delete
    fn find_active_notes_updated_before_excluding_priority(
        &self,
        owner_id: &str,
        threshold: &NaiveDateTime,
        excluded_priority: Priority,
    ) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Find all notes of an owner with a specific priority
    ///
    /// Respects the soft-delete
    fn find_active_notes_by_priority(
        &self,
        owner_id: &str,
        priority: Priority,
    ) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Find all soft-deleted notes of an owner
    fn find_soft_deleted_notes(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Vec<Note>>> + Send;
}
