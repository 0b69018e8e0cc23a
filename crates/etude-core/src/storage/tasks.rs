//! To-do list.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{KvStore, ListStore, TASKS_KEY};
use crate::error::{Result, ValidationError};
use crate::records::Task;

#[derive(Clone)]
pub struct TaskList {
    store: Arc<dyn KvStore>,
}

impl TaskList {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.store.get_list(TASKS_KEY)
    }

    /// Adds an open task created at `now`. A blank subject is dropped.
    ///
    /// # Errors
    /// Returns an error if the title is blank or the store write fails.
    pub fn add(&self, title: &str, subject: Option<&str>, now: DateTime<Utc>) -> Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".into(),
                message: "a task needs a title".into(),
            }
            .into());
        }
        let task = Task {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            title: title.to_string(),
            subject: subject
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            completed: false,
            created_at: now,
        };
        let mut all = self.tasks();
        all.push(task.clone());
        self.store.set_list(TASKS_KEY, &all)?;
        Ok(task)
    }

    /// Marks a task done or open again. Returns `false` when `id` is unknown.
    ///
    /// # Errors
    /// Returns an error if the store write fails.
    pub fn set_completed(&self, id: &str, completed: bool) -> Result<bool> {
        let mut all = self.tasks();
        let Some(task) = all.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.completed = completed;
        self.store.set_list(TASKS_KEY, &all)?;
        Ok(true)
    }

    /// # Errors
    /// Returns an error if the store write fails.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut all = self.tasks();
        let before = all.len();
        all.retain(|t| t.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.store.set_list(TASKS_KEY, &all)?;
        Ok(true)
    }

    /// Open tasks first, each group in creation order.
    pub fn pending_first(&self) -> Vec<Task> {
        let (mut open, done): (Vec<_>, Vec<_>) =
            self.tasks().into_iter().partition(|t| !t.completed);
        open.extend(done);
        open
    }
}
