//! Notes API endpoints
//!
//! Everything related to managing the notes of the current user

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::note_service::NoteService;
use crate::note_service::NoteValues;
use crate::notes::Note;
use crate::notes::Page;
use crate::notes::Priority;
use crate::storage::Storage;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::QueryParameters;
use super::Success;

/// Note response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    /// Note ID
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Content
    pub content: String,

    /// Priority
    pub priority: Priority,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// Soft-deleted at, never set for notes served by the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<NaiveDateTime>,
}

impl NoteResponse {
    /// Create a response from a [`Note`](Note)
    fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            priority: note.priority,
            created_at: note.created_at,
            updated_at: note.updated_at,
            deleted_at: note.deleted_at,
        }
    }

    /// Create a response from multiple [`Note`](Note)s
    fn from_note_multiple(notes: Vec<Note>) -> Vec<Self> {
        notes.into_iter().map(Self::from_note).collect()
    }
}

/// A page of notes going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesResponse {
    /// Notes on this page, newest first
    pub notes: Vec<NoteResponse>,

    /// Number of pages available
    pub total_pages: u32,

    /// Zero-based number of this page
    pub current_page: u32,
}

impl NotesResponse {
    /// Create a response from a page of notes
    fn from_page(page: Page<Note>) -> Self {
        Self {
            notes: NoteResponse::from_note_multiple(page.items),
            total_pages: page.total_pages,
            current_page: page.page_number,
        }
    }
}

/// Listing parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParameters {
    /// Zero-based page number
    #[serde(default)]
    page: u32,

    /// Only notes with this priority
    priority: Option<String>,

    /// Only notes created within this range: `ALL`, `TODAY` or `PAST_SEVEN_DAYS`
    date_range: Option<String>,
}

/// List the notes of the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:8080/api/notes?page=0&dateRange=TODAY'
/// ```
///
/// Response:
/// ```json
/// { "data": { "notes": [ { "id": "<uuid>", "title": "Groceries" ... } ], "totalPages": 1, "currentPage": 0 } }
/// ```
pub async fn list<S: Storage>(
    Extension(notes): Extension<NoteService<S>>,
    current_user: CurrentUser<S>,
    QueryParameters(parameters): QueryParameters<ListParameters>,
) -> Result<Success<NotesResponse>, Error> {
    let page = notes
        .list(
            &current_user.owner_id(),
            parameters.page,
            parameters.priority.as_deref(),
            parameters.date_range.as_deref(),
        )
        .await?;

    Ok(Success::ok(NotesResponse::from_page(page)))
}

/// Get a single note
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:8080/api/notes/<uuid>
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "title": "Groceries" ... } }
/// ```
pub async fn single<S: Storage>(
    Extension(notes): Extension<NoteService<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<NoteResponse>, Error> {
    let note = notes.get(&current_user.owner_id(), &note_id).await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Note form, used for both creating and updating
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteForm {
    /// Title of the note
    title: String,

    /// Content of the note
    content: String,

    /// Priority of the note
    priority: Priority,
}

impl NoteForm {
    /// Values for the note lifecycle
    fn values(&self) -> NoteValues<'_> {
        NoteValues {
            title: &self.title,
            content: &self.content,
            priority: self.priority,
        }
    }
}

/// Create a note based on the [`NoteForm`](NoteForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Groceries", "content": "Milk", "priority": "NOW" }' \
///     http://localhost:8080/api/notes
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "title": "Groceries" ... } }
/// ```
pub async fn create<S: Storage>(
    Extension(notes): Extension<NoteService<S>>,
    current_user: CurrentUser<S>,
    Form(form): Form<NoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let note = notes
        .create(&current_user.owner_id(), &form.values())
        .await?;

    Ok(Success::created(NoteResponse::from_note(note)))
}

/// Update a note based on the [`NoteForm`](NoteForm) form
///
/// Title, content and priority are all replaced
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Groceries", "content": "Milk", "priority": "DONE" }' \
///     http://localhost:8080/api/notes/<uuid>
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "title": "Groceries" ... } }
/// ```
pub async fn update<S: Storage>(
    Extension(notes): Extension<NoteService<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
    Form(form): Form<NoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let note = notes
        .update(&current_user.owner_id(), &note_id, &form.values())
        .await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Soft-delete a note
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:8080/api/notes/<uuid>
/// ```
pub async fn delete<S: Storage>(
    Extension(notes): Extension<NoteService<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    notes
        .soft_delete(&current_user.owner_id(), &note_id)
        .await?;

    Ok(Success::<&'static str>::no_content())
}
