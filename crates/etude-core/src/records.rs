//! Persisted records.
//!
//! Session and break records are append-only: once written to the store they
//! are never updated in place, only deleted as a whole (a subject rename is the
//! one bulk rewrite). Courses, tasks and links are small editable lists.
//! Field names are camelCase on the wire.

use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Description attached to sessions produced by the weekly planner.
pub const GENERATED_DESCRIPTION: &str = "Généré automatiquement";

/// One completed or planned block of study time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub date: DateTime<Utc>,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    /// Minutes.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default)]
    pub is_exam: bool,
}

impl StudySession {
    /// A session recorded from the timer, starting at `start`.
    pub fn recorded(subject: impl Into<String>, duration: u32, start: DateTime<Utc>) -> Self {
        let local = start.with_timezone(&Local);
        Self {
            id: format!("session-{}", uuid::Uuid::new_v4()),
            date: start,
            subject: subject.into(),
            description: String::new(),
            duration,
            start_time: Some(format!("{:02}:{:02}", local.hour(), local.minute())),
            is_exam: false,
        }
    }

    pub fn is_generated(&self) -> bool {
        self.description == GENERATED_DESCRIPTION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakKind {
    ShortBreak,
    LongBreak,
}

/// A completed (or stopped early) break countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: BreakKind,
    /// Minutes.
    pub duration: u32,
}

impl BreakRecord {
    pub fn new(kind: BreakKind, duration: u32, date: DateTime<Utc>) -> Self {
        Self {
            id: format!("break-{}", uuid::Uuid::new_v4()),
            date,
            kind,
            duration,
        }
    }
}

/// One chapter of a course checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: format!("chapter-{}", uuid::Uuid::new_v4()),
            title: title.into(),
            done: false,
        }
    }
}

/// A course and its chapter checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub favorite: bool,
}

impl Course {
    /// Chapters ticked off, and the total.
    pub fn progress(&self) -> (usize, usize) {
        let done = self.chapters.iter().filter(|c| c.done).count();
        (done, self.chapters.len())
    }
}

/// A to-do item, optionally tied to a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A bookmarked study resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub name: String,
    pub url: String,
}
