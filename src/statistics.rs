//! Statistics over the notes of a single owner
//!
//! Every call recomputes everything from storage, nothing is cached

use crate::note_service::NoteService;
use crate::note_service::Result;
use crate::storage::Storage;

/// Summary of the notes of an owner
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    /// Active notes, not done, not updated for a while
    pub stale_notes_count: usize,

    /// Active notes with priority `NOW`
    pub high_priority_notes_count: usize,

    /// Average hours from creation to last update of active done notes
    pub average_completion_time_hours: f64,

    /// Average hours from creation to soft-delete
    pub average_deletion_time_hours: f64,
}

/// Statistics service
#[derive(Clone)]
pub struct StatisticsService<S: Storage> {
    /// Notes to summarize
    notes: NoteService<S>,
}

impl<S: Storage> StatisticsService<S> {
    /// Create the service on top of the note lifecycle
    pub fn new(notes: NoteService<S>) -> Self {
        Self { notes }
    }

    /// Summarize the notes of an owner
    ///
    /// Each metric is its own query, they are not taken from a single snapshot
    pub async fn summarize(&self, owner_id: &str) -> Result<Statistics> {
        let stale_notes_count = self.notes.count_stale_notes(owner_id).await?;
        let high_priority_notes_count = self.notes.count_high_priority_notes(owner_id).await?;
        let average_completion_time_hours = self.notes.average_completion_hours(owner_id).await?;
        let average_deletion_time_hours = self.notes.average_deletion_hours(owner_id).await?;

        tracing::debug!("Summarized notes for {owner_id}");

        Ok(Statistics {
            stale_notes_count,
            high_priority_notes_count,
            average_completion_time_hours,
            average_deletion_time_hours,
        })
    }
}
