//! # Etude Core Library
//!
//! This library provides the core logic for the Etude study tracker. Every
//! operation is reachable from the `etude` CLI binary, which is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: a wall-clock-based state machine that survives
//!   restarts through a persisted snapshot; the caller drives it with `tick()`
//!   or hands it to a [`CountdownDriver`] for a live poll loop
//! - **Coordinator**: turns countdown completions into session and break records
//! - **Scheduler**: greedy weekly planner for study hours
//! - **Storage**: key-value store (SQLite or in-memory) holding JSON lists
//!   (sessions, breaks, course checklists, tasks, links), plus TOML configuration
//!
//! ## Key Components
//!
//! - [`CountdownEngine`]: countdown state machine
//! - [`SessionCoordinator`]: completion flow
//! - [`generate_schedule`]: weekly planner
//! - [`SessionLog`]: session and break persistence, subject renames
//! - [`CourseBook`], [`TaskList`], [`LinkList`]: editable study lists
//! - [`Config`]: application configuration

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod records;
pub mod scheduler;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{
    CompletionOutcome, CompletionPrompt, Notifier, PendingSubject, Resolution, SessionCoordinator,
    SilentNotifier, SoundKind,
};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use records::{BreakKind, BreakRecord, Chapter, Course, Link, StudySession, Task};
pub use scheduler::{generate_schedule, generate_schedule_in, ScheduleOutcome, ScheduleRequest, StudyItem};
pub use storage::{
    Config, CourseBook, Database, KvStore, LinkList, ListStore, MemoryStore, SessionLog, TaskList,
};
pub use timer::{CountdownDriver, CountdownEngine, Restored, TimerMode, TimerSnapshot, TimerState};
