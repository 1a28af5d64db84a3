//! Note lifecycle
//!
//! Creating, reading, updating, soft-deleting and listing the notes of a single owner. Every
//! operation is scoped to the owner: a note of somebody else looks exactly like a note that
//! does not exist.

use core::fmt;

use chrono::Local;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::SubsecRound;
use chrono::TimeDelta;
use chrono::Utc;
use uuid::Uuid;

use crate::notes::DateRange;
use crate::notes::Note;
use crate::notes::Page;
use crate::notes::PageRequest;
use crate::notes::ParsePriorityError;
use crate::notes::Priority;
use crate::storage;
use crate::storage::Storage;

/// Notes not updated for this long are stale
const STALE_AFTER: TimeDelta = TimeDelta::days(2);

/// Window of the `PAST_SEVEN_DAYS` filter
const PAST_SEVEN_DAYS: TimeDelta = TimeDelta::days(7);

/// Note lifecycle errors
#[derive(Debug)]
pub enum Error {
    /// No active note of the owner has the ID
    NotFound,

    /// Input could not be interpreted
    Validation {
        /// What was invalid, like `priority`
        field: &'static str,

        /// Why it was invalid
        reason: String,
    },

    /// The storage failed
    Storage(storage::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Storage(err) => Some(err),
            Error::NotFound | Error::Validation { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "Note not found"),
            Error::Validation { field, reason } => write!(f, "Invalid {field}: {reason}"),
            Error::Storage(error) => write!(f, "Storage error: {error}"),
        }
    }
}

impl From<storage::Error> for Error {
    fn from(error: storage::Error) -> Self {
        Error::Storage(error)
    }
}

impl From<ParsePriorityError> for Error {
    fn from(error: ParsePriorityError) -> Self {
        Error::Validation {
            field: "priority",
            reason: error.to_string(),
        }
    }
}

/// Result type of the note lifecycle
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create or update a note with
pub struct NoteValues<'a> {
    /// Title of the note
    pub title: &'a str,

    /// Content of the note
    pub content: &'a str,

    /// Priority of the note
    pub priority: Priority,
}

/// Current time, at the precision timestamps are stored with
fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// Start of the current local day, in UTC
fn start_of_local_day() -> NaiveDateTime {
    let now = Local::now();

    now.date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        // midnight skipped by a DST transition
        .unwrap_or_else(|| now - now.time().signed_duration_since(NaiveTime::MIN))
        .naive_utc()
}

/// Average duration in hours, `0.0` without any durations
#[allow(clippy::cast_precision_loss)]
fn average_hours<I>(durations: I) -> f64
where
    I: ExactSizeIterator<Item = TimeDelta>,
{
    let count = durations.len();

    if count == 0 {
        return 0.0;
    }

    let total_hours: f64 = durations
        .map(|duration| duration.num_seconds() as f64 / 3600.0)
        .sum();

    total_hours / count as f64
}

/// Note lifecycle service
///
/// Holds no state of its own, everything lives in storage
#[derive(Clone)]
pub struct NoteService<S: Storage> {
    /// Storage of the notes
    storage: S,
}

impl<S: Storage> NoteService<S> {
    /// Create the service on top of a storage
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a note for an owner
    pub async fn create(&self, owner_id: &str, values: &NoteValues<'_>) -> Result<Note> {
        let now = now();

        let note = Note {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            title: values.title.to_string(),
            content: values.content.to_string(),
            priority: values.priority,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let note = self.storage.save_note(&note).await?;

        tracing::debug!("Created note {} for {owner_id}", note.id);

        Ok(note)
    }

    /// Get an active note of an owner
    pub async fn get(&self, owner_id: &str, id: &Uuid) -> Result<Note> {
        self.storage
            .find_single_active_note(owner_id, id)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Overwrite title, content and priority of an active note
    ///
    /// The last updated at always moves forward, even when the clock does not
    pub async fn update(&self, owner_id: &str, id: &Uuid, values: &NoteValues<'_>) -> Result<Note> {
        let mut note = self.get(owner_id, id).await?;

        note.title = values.title.to_string();
        note.content = values.content.to_string();
        note.priority = values.priority;
        note.updated_at = now().max(note.updated_at + TimeDelta::microseconds(1));

        let note = self.storage.save_note(&note).await?;

        tracing::debug!("Updated note {} for {owner_id}", note.id);

        Ok(note)
    }

    /// Soft-delete an active note
    ///
    /// Deleting twice fails with `NotFound`, the note is no longer active
    pub async fn soft_delete(&self, owner_id: &str, id: &Uuid) -> Result<()> {
        let mut note = self.get(owner_id, id).await?;

        note.deleted_at = Some(now().max(note.updated_at));

        self.storage.save_note(&note).await?;

        tracing::debug!("Soft-deleted note {} for {owner_id}", note.id);

        Ok(())
    }

    /// List a page of active notes of an owner, newest first
    ///
    /// A priority filter wins over a date range filter, only one of them is applied. An unknown
    /// priority token is a `Validation` error, an unknown date range token lists everything.
    pub async fn list(
        &self,
        owner_id: &str,
        page: u32,
        priority: Option<&str>,
        date_range: Option<&str>,
    ) -> Result<Page<Note>> {
        let priority = priority.map(str::parse::<Priority>).transpose()?;
        let date_range = date_range.map_or(DateRange::All, DateRange::from_token);
        let page = PageRequest::of(page);

        tracing::debug!(
            "Listing notes for {owner_id}: page {}, priority {priority:?}, date range {date_range:?}",
            page.page
        );

        let notes = if let Some(priority) = priority {
            self.storage
                .find_page_of_active_notes_by_priority(owner_id, priority, &page)
                .await?
        } else {
            let threshold = match date_range {
                DateRange::Today => Some(start_of_local_day()),
                DateRange::PastSevenDays => Some(now() - PAST_SEVEN_DAYS),
                DateRange::All => None,
            };

            if let Some(threshold) = threshold {
                self.storage
                    .find_page_of_active_notes_created_after(owner_id, &threshold, &page)
                    .await?
            } else {
                self.storage
                    .find_page_of_active_notes(owner_id, &page)
                    .await?
            }
        };

        Ok(notes)
    }

    /// Count active notes that are not done and have not been updated for a while
    pub async fn count_stale_notes(&self, owner_id: &str) -> Result<usize> {
        let threshold = now() - STALE_AFTER;

        let notes = self
            .storage
            .find_active_notes_updated_before_excluding_priority(
                owner_id,
                &threshold,
                Priority::Done,
            )
            .await?;

        Ok(notes.len())
    }

    /// Count active notes that need attention right now
    pub async fn count_high_priority_notes(&self, owner_id: &str) -> Result<usize> {
        let notes = self
            .storage
            .find_active_notes_by_priority(owner_id, Priority::Now)
            .await?;

        Ok(notes.len())
    }

    /// Average hours between creating a note and its last update, over active done notes
    pub async fn average_completion_hours(&self, owner_id: &str) -> Result<f64> {
        let notes = self
            .storage
            .find_active_notes_by_priority(owner_id, Priority::Done)
            .await?;

        Ok(average_hours(
            notes.iter().map(|note| note.updated_at - note.created_at),
        ))
    }

    /// Average hours between creating a note and soft-deleting it
    pub async fn average_deletion_hours(&self, owner_id: &str) -> Result<f64> {
        let notes = self.storage.find_soft_deleted_notes(owner_id).await?;

        Ok(average_hours(notes.iter().map(|note| {
            note.deleted_at.unwrap_or(note.created_at) - note.created_at
        })))
    }
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use crate::storage::Memory;

    use super::*;

    const OWNER: &str = "owner";
    const OTHER_OWNER: &str = "other-owner";

    fn values(title: &'static str, priority: Priority) -> NoteValues<'static> {
        NoteValues {
            title,
            content: "Some content",
            priority,
        }
    }

    /// Put a note straight into storage, with chosen timestamps
    async fn insert_note(
        storage: &Memory,
        owner_id: &str,
        title: &str,
        priority: Priority,
        created_at: NaiveDateTime,
    ) -> Note {
        let note = Note {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            content: "Some content".to_string(),
            priority,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };

        storage.save_note(&note).await.unwrap()
    }

    fn setup() -> (Memory, NoteService<Memory>) {
        let storage = Memory::new();

        (storage.clone(), NoteService::new(storage))
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (_, service) = setup();

        let created = service
            .create(OWNER, &values("Groceries", Priority::Later))
            .await
            .unwrap();
        assert_eq!(OWNER, created.owner_id);
        assert_eq!(created.created_at, created.updated_at);
        assert!(created.deleted_at.is_none());

        let note = service.get(OWNER, &created.id).await.unwrap();
        assert_eq!(created, note);
        assert_eq!("Groceries", note.title);
        assert_eq!("Some content", note.content);
        assert_eq!(Priority::Later, note.priority);
    }

    #[tokio::test]
    async fn test_update_keeps_identity_and_advances_updated_at() {
        let (_, service) = setup();

        let created = service
            .create(OWNER, &values("Draft", Priority::Now))
            .await
            .unwrap();

        let updated = service
            .update(OWNER, &created.id, &values("Final", Priority::Done))
            .await
            .unwrap();
        assert_eq!(created.id, updated.id);
        assert_eq!(created.owner_id, updated.owner_id);
        assert_eq!(created.created_at, updated.created_at);
        assert_eq!(created.deleted_at, updated.deleted_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!("Final", updated.title);
        assert_eq!(Priority::Done, updated.priority);

        let again = service
            .update(OWNER, &created.id, &values("Final", Priority::Done))
            .await
            .unwrap();
        assert!(again.updated_at > updated.updated_at);
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let (storage, service) = setup();

        let created = service
            .create(OWNER, &values("Old idea", Priority::Someday))
            .await
            .unwrap();

        service.soft_delete(OWNER, &created.id).await.unwrap();

        assert!(matches!(
            service.get(OWNER, &created.id).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            service
                .update(OWNER, &created.id, &values("Revived", Priority::Now))
                .await,
            Err(Error::NotFound)
        ));

        // not idempotent, the note is no longer reachable
        assert!(matches!(
            service.soft_delete(OWNER, &created.id).await,
            Err(Error::NotFound)
        ));

        let deleted = storage.find_soft_deleted_notes(OWNER).await.unwrap();
        assert_eq!(1, deleted.len());
        assert_eq!("Old idea", deleted[0].title);
        assert!(deleted[0].deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_other_owner_is_not_found() {
        let (_, service) = setup();

        let created = service
            .create(OWNER, &values("Private", Priority::Now))
            .await
            .unwrap();

        assert!(matches!(
            service.get(OTHER_OWNER, &created.id).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            service
                .update(OTHER_OWNER, &created.id, &values("Mine now", Priority::Now))
                .await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            service.soft_delete(OTHER_OWNER, &created.id).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            service.get(OWNER, &Uuid::new_v4()).await,
            Err(Error::NotFound)
        ));

        // untouched by the attempts of the other owner
        let note = service.get(OWNER, &created.id).await.unwrap();
        assert_eq!(created, note);
    }

    #[tokio::test]
    async fn test_list_by_priority() {
        let (storage, service) = setup();
        let now = now();

        let older = insert_note(
            &storage,
            OWNER,
            "older",
            Priority::Now,
            now - TimeDelta::hours(3),
        )
        .await;
        insert_note(&storage, OWNER, "later", Priority::Later, now - TimeDelta::hours(2)).await;
        let newer = insert_note(
            &storage,
            OWNER,
            "newer",
            Priority::Now,
            now - TimeDelta::hours(1),
        )
        .await;
        insert_note(&storage, OTHER_OWNER, "foreign", Priority::Now, now).await;

        // priority wins over the date range
        let page = service
            .list(OWNER, 0, Some("NOW"), Some("TODAY"))
            .await
            .unwrap();

        let ids: Vec<Uuid> = page.items.iter().map(|note| note.id).collect();
        assert_eq!(vec![newer.id, older.id], ids);
        assert!(page.items.iter().all(|note| note.priority == Priority::Now));
        assert_eq!(1, page.total_pages);
        assert_eq!(0, page.page_number);
    }

    #[tokio::test]
    async fn test_list_past_seven_days() {
        let (storage, service) = setup();
        let now = now();

        let offsets = [
            TimeDelta::days(12),
            TimeDelta::days(11),
            TimeDelta::days(4),
            TimeDelta::days(3),
            TimeDelta::hours(12),
            TimeDelta::hours(8),
            TimeDelta::hours(6),
            TimeDelta::hours(4),
            TimeDelta::hours(2),
            TimeDelta::zero(),
        ];

        for (index, offset) in offsets.iter().enumerate() {
            insert_note(
                &storage,
                OWNER,
                &format!("note {index}"),
                Priority::Later,
                now - *offset,
            )
            .await;
        }

        let page = service
            .list(OWNER, 0, None, Some("PAST_SEVEN_DAYS"))
            .await
            .unwrap();

        let titles: Vec<&str> = page.items.iter().map(|note| note.title.as_str()).collect();
        assert_eq!(
            vec![
                "note 9", "note 8", "note 7", "note 6", "note 5", "note 4", "note 3", "note 2"
            ],
            titles
        );
        assert_eq!(1, page.total_pages);

        let page = service.list(OWNER, 0, None, None).await.unwrap();
        assert_eq!(10, page.items.len());
        assert_eq!("note 9", page.items[0].title);
        assert_eq!("note 0", page.items[9].title);
    }

    #[tokio::test]
    async fn test_list_today() {
        let (storage, service) = setup();
        let midnight = start_of_local_day();

        insert_note(
            &storage,
            OWNER,
            "yesterday",
            Priority::Now,
            midnight - TimeDelta::minutes(1),
        )
        .await;
        insert_note(&storage, OWNER, "midnight", Priority::Now, midnight).await;
        insert_note(&storage, OWNER, "now", Priority::Now, now()).await;

        let page = service.list(OWNER, 0, None, Some("TODAY")).await.unwrap();

        let titles: Vec<&str> = page.items.iter().map(|note| note.title.as_str()).collect();
        assert!(titles.contains(&"midnight"));
        assert!(titles.contains(&"now"));
        assert!(!titles.contains(&"yesterday"));
    }

    #[tokio::test]
    async fn test_list_unknown_date_range_is_all() {
        let (storage, service) = setup();
        let now = now();

        insert_note(
            &storage,
            OWNER,
            "ancient",
            Priority::Someday,
            now - TimeDelta::days(400),
        )
        .await;
        insert_note(&storage, OWNER, "fresh", Priority::Someday, now).await;

        let all = service.list(OWNER, 0, None, None).await.unwrap();
        let unknown = service
            .list(OWNER, 0, None, Some("LAST_DECADE"))
            .await
            .unwrap();

        assert_eq!(all.items, unknown.items);
        assert_eq!(2, unknown.items.len());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let (storage, service) = setup();
        let now = now();

        for minutes in 0..23 {
            insert_note(
                &storage,
                OWNER,
                &format!("note {minutes}"),
                Priority::Later,
                now - TimeDelta::minutes(minutes),
            )
            .await;
        }

        let first = service.list(OWNER, 0, None, None).await.unwrap();
        assert_eq!(10, first.items.len());
        assert_eq!(3, first.total_pages);
        assert_eq!("note 0", first.items[0].title);

        let last = service.list(OWNER, 2, None, None).await.unwrap();
        assert_eq!(3, last.items.len());
        assert_eq!(2, last.page_number);
        assert_eq!("note 22", last.items[2].title);

        let beyond = service.list(OWNER, 7, None, None).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(3, beyond.total_pages);
        assert_eq!(7, beyond.page_number);
    }

    #[tokio::test]
    async fn test_list_skips_deleted_notes() {
        let (_, service) = setup();

        let kept = service
            .create(OWNER, &values("Kept", Priority::Now))
            .await
            .unwrap();
        let deleted = service
            .create(OWNER, &values("Deleted", Priority::Now))
            .await
            .unwrap();
        service.soft_delete(OWNER, &deleted.id).await.unwrap();

        let page = service.list(OWNER, 0, None, None).await.unwrap();
        assert_eq!(vec![kept], page.items);
        assert_eq!(1, page.total_pages);
    }

    #[tokio::test]
    async fn test_list_unknown_priority_is_invalid() {
        let (_, service) = setup();

        let result = service.list(OWNER, 0, Some("URGENT"), None).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "priority",
                ..
            })
        ));

        // tokens are case sensitive
        let result = service.list(OWNER, 0, Some("now"), None).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_storage_failures_are_passed_on() {
        use crate::storage::failing::FAILURE;
        use crate::storage::failing::Failing;

        let service = NoteService::new(Failing);

        let is_storage_failure = |result: Result<_>| {
            matches!(
                result,
                Err(Error::Storage(storage::Error::Connection(message))) if message == FAILURE
            )
        };

        assert!(is_storage_failure(
            service.create(OWNER, &values("Groceries", Priority::Now)).await.map(|_| ())
        ));
        assert!(is_storage_failure(
            service.get(OWNER, &Uuid::new_v4()).await.map(|_| ())
        ));
        assert!(is_storage_failure(
            service
                .update(OWNER, &Uuid::new_v4(), &values("Groceries", Priority::Done))
                .await
                .map(|_| ())
        ));
        assert!(is_storage_failure(
            service.soft_delete(OWNER, &Uuid::new_v4()).await
        ));
        for (priority, date_range) in [
            (None, None),
            (Some("NOW"), None),
            (None, Some("TODAY")),
            (None, Some("PAST_SEVEN_DAYS")),
        ] {
            assert!(is_storage_failure(
                service.list(OWNER, 0, priority, date_range).await.map(|_| ())
            ));
        }
    }

    #[test]
    fn test_average_hours() {
        assert!(average_hours(Vec::<TimeDelta>::new().into_iter()).abs() < f64::EPSILON);

        let average = average_hours(vec![TimeDelta::hours(1), TimeDelta::hours(4)].into_iter());
        assert!((average - 2.5).abs() < f64::EPSILON);
    }
}
