//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::notes::Note;
use crate::notes::Page;
use crate::notes::PageRequest;
use crate::notes::Priority;
use crate::users::User;

use super::CreateUserValues;
use super::Error;
use super::Result;
use super::Storage;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All users in storage
    users: Arc<Mutex<HashMap<Uuid, User>>>,

    /// All notes in storage, soft-deleted ones included
    notes: Arc<Mutex<HashMap<Uuid, Note>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the active notes of an owner matching `predicate`
    async fn active_notes_where<P>(&self, owner_id: &str, predicate: P) -> Vec<Note>
    where
        P: Fn(&Note) -> bool,
    {
        self.notes
            .lock()
            .await
            .values()
            .filter(|note| note.owner_id == owner_id && !note.is_deleted() && predicate(note))
            .cloned()
            .collect()
    }

    /// Page through the active notes of an owner matching `predicate`, newest first
    async fn page_of_active_notes_where<P>(
        &self,
        owner_id: &str,
        page: &PageRequest,
        predicate: P,
    ) -> Page<Note>
    where
        P: Fn(&Note) -> bool,
    {
        let mut notes = self.active_notes_where(owner_id, predicate).await;

        notes.sort_by_key(|note| (Reverse(note.created_at), note.id));

        let total = notes.len() as u64;
        let items = notes
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.size as usize)
            .collect();

        Page {
            items,
            total_pages: page.total_pages(total),
            page_number: page.page,
        }
    }
}

impl Storage for Memory {
    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        // one lock for the check and the insert
        let mut users = self.users.lock().await;

        if users.values().any(|user| user.username == values.username) {
            return Err(Error::AlreadyExists);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: values.username.to_string(),
            hashed_password: values.hashed_password.to_string(),
        };

        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn save_note(&self, note: &Note) -> Result<Note> {
        self.notes.lock().await.insert(note.id, note.clone());

        Ok(note.clone())
    }

    async fn find_single_active_note(&self, owner_id: &str, id: &Uuid) -> Result<Option<Note>> {
        Ok(self
            .notes
            .lock()
            .await
            .get(id)
            .filter(|note| note.owner_id == owner_id && !note.is_deleted())
            .cloned())
    }

    async fn find_page_of_active_notes(
        &self,
        owner_id: &str,
        page: &PageRequest,
    ) -> Result<Page<Note>> {
        Ok(self
            .page_of_active_notes_where(owner_id, page, |_| true)
            .await)
    }

    async fn find_page_of_active_notes_by_priority(
        &self,
        owner_id: &str,
        priority: Priority,
        page: &PageRequest,
    ) -> Result<Page<Note>> {
        Ok(self
            .page_of_active_notes_where(owner_id, page, |note| note.priority == priority)
            .await)
    }

    async fn find_page_of_active_notes_created_after(
        &self,
        owner_id: &str,
        threshold: &NaiveDateTime,
        page: &PageRequest,
    ) -> Result<Page<Note>> {
        Ok(self
            .page_of_active_notes_where(owner_id, page, |note| note.created_at >= *threshold)
            .await)
    }

    async fn find_active_notes_updated_before_excluding_priority(
        &self,
        owner_id: &str,
        threshold: &NaiveDateTime,
        excluded_priority: Priority,
    ) -> Result<Vec<Note>> {
        Ok(self
            .active_notes_where(owner_id, |note| {
                note.updated_at < *threshold && note.priority != excluded_priority
            })
            .await)
    }

    async fn find_active_notes_by_priority(
        &self,
        owner_id: &str,
        priority: Priority,
    ) -> Result<Vec<Note>> {
        Ok(self
            .active_notes_where(owner_id, |note| note.priority == priority)
            .await)
    }

    async fn find_soft_deleted_notes(&self, owner_id: &str) -> Result<Vec<Note>> {
        Ok(self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| note.owner_id == owner_id && note.is_deleted())
            .cloned()
            .collect())
    }
}
