//! Notes and the types used to query them

use core::fmt;
use std::str::FromStr;

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Number of notes in a single page of a listing
pub const PAGE_SIZE: u32 = 10;

/// Priority of a note
///
/// `Done` marks a note as completed
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Needs attention right now
    Now,

    /// Needs attention later
    Later,

    /// Might need attention at some point
    Someday,

    /// Completed
    Done,
}

impl Priority {
    /// All priorities, in order of urgency
    pub const ALL: [Priority; 4] = [
        Priority::Now,
        Priority::Later,
        Priority::Someday,
        Priority::Done,
    ];

    /// Token used for the priority on the outside
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Now => "NOW",
            Priority::Later => "LATER",
            Priority::Someday => "SOMEDAY",
            Priority::Done => "DONE",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority token did not match any known priority
#[derive(Debug, PartialEq, Eq)]
pub struct ParsePriorityError(String);

impl std::error::Error for ParsePriorityError {}

impl fmt::Display for ParsePriorityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            r#"Unknown priority "{}", expected one of NOW, LATER, SOMEDAY or DONE"#,
            self.0
        )
    }
}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == token)
            .ok_or_else(|| ParsePriorityError(token.to_string()))
    }
}

/// Creation date filter of a listing
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DateRange {
    /// No filter
    #[default]
    All,

    /// Created since the start of the current local day
    Today,

    /// Created within the last seven days
    PastSevenDays,
}

impl DateRange {
    /// Interpret a date range token
    ///
    /// Unknown tokens do not filter anything, same as `ALL`
    pub fn from_token(token: &str) -> Self {
        match token {
            "TODAY" => DateRange::Today,
            "PAST_SEVEN_DAYS" => DateRange::PastSevenDays,
            _ => DateRange::All,
        }
    }
}

/// A single note of a user
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    /// Note ID
    pub id: Uuid,

    /// Identifier of the owning user
    pub owner_id: String,

    /// Title
    pub title: String,

    /// Free-form content
    pub content: String,

    /// Priority
    pub priority: Priority,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// Soft-deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

impl Note {
    /// Is the note soft-deleted?
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Which page of a listing to fetch
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    /// Zero-based page number
    pub page: u32,

    /// Maximum number of items on a page
    pub size: u32,
}

impl PageRequest {
    /// Request a page with the default page size
    pub fn of(page: u32) -> Self {
        Self {
            page,
            size: PAGE_SIZE,
        }
    }

    /// Number of items to skip before this page starts
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Number of pages needed for `total` items
    pub fn total_pages(&self, total: u64) -> u32 {
        u32::try_from(total.div_ceil(u64::from(self.size.max(1)))).unwrap_or(u32::MAX)
    }
}

/// A single page of a listing
#[derive(Clone, Debug)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// Number of pages available
    pub total_pages: u32,

    /// Zero-based number of this page
    pub page_number: u32,
}
