//! Storage that is never reachable
//!
//! Every call fails with a connection error, for testing how failures travel up

use chrono::NaiveDateTime;
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

/// Message of every failure
pub const FAILURE: &str = "storage is unreachable";

/// A storage failing every call
#[derive(Clone, Debug, Default)]
pub struct Failing;

fn fail<T>() -> Result<T> {
    Err(Error::Connection(FAILURE.to_string()))
}

impl Storage for Failing {
    async fn find_single_user_by_username(&self, _username: &str) -> Result<Option<User>> {
        fail()
    }

    async fn find_single_user_by_id(&self, _id: &Uuid) -> Result<Option<User>> {
        fail()
    }

    async fn create_user(&self, _values: &CreateUserValues<'_>) -> Result<User> {
        fail()
    }

    async fn save_note(&self, _note: &Note) -> Result<Note> {
        fail()
    }

    async fn find_single_active_note(&self, _owner_id: &str, _id: &Uuid) -> Result<Option<Note>> {
        fail()
    }

    async fn find_page_of_active_notes(
        &self,
        _owner_id: &str,
        _page: &PageRequest,
    ) -> Result<Page<Note>> {
        fail()
    }

    async fn find_page_of_active_notes_by_priority(
        &self,
        _owner_id: &str,
        _priority: Priority,
        _page: &PageRequest,
    ) -> Result<Page<Note>> {
        fail()
    }

    async fn find_page_of_active_notes_created_after(
        &self,
        _owner_id: &str,
        _threshold: &NaiveDateTime,
        _page: &PageRequest,
    ) -> Result<Page<Note>> {
        fail()
    }

    async fn find_active_notes_updated_before_excluding_priority(
        &self,
        _owner_id: &str,
        _threshold: &NaiveDateTime,
        _excluded_priority: Priority,
    ) -> Result<Vec<Note>> {
        fail()
    }

    async fn find_active_notes_by_priority(
        &self,
        _owner_id: &str,
        _priority: Priority,
    ) -> Result<Vec<Note>> {
        fail()
    }

    async fn find_soft_deleted_notes(&self, _owner_id: &str) -> Result<Vec<Note>> {
        fail()
    }
}
