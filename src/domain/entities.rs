//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single task record.
///
/// `id == 0` marks a record that has not been persisted yet; the store assigns the real id on
/// first insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Todo {
    /// Build an unsaved todo with the given title and description.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            completed: false,
            completed_at: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    /// Stamp `updated_at`, and `created_at` as well when the record is still unsaved.
    pub fn touch(&mut self) {
        let now = now_utc();
        if self.is_new() {
            self.created_at = now;
        }
        self.updated_at = now;
    }

    /// Mark the todo as done. Callers check [`Todo::completed`] first.
    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.completed_at = Some(now_utc());
    }
}

/// Current UTC time truncated to the microsecond resolution Postgres keeps.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_microsecond(now.microsecond()).unwrap_or(now)
}
