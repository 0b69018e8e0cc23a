//! Append/delete access to the session and break lists.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{KvStore, ListStore, BREAKS_KEY, SESSIONS_KEY};
use crate::error::{Result, ValidationError};
use crate::records::{BreakRecord, StudySession};

/// Whole-record operations over a [`KvStore`].
#[derive(Clone)]
pub struct SessionLog {
    store: Arc<dyn KvStore>,
}

impl SessionLog {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn sessions(&self) -> Vec<StudySession> {
        self.store.get_list(SESSIONS_KEY)
    }

    pub fn breaks(&self) -> Vec<BreakRecord> {
        self.store.get_list(BREAKS_KEY)
    }

    /// Sessions whose `date` falls in `[from, to]`.
    pub fn sessions_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<StudySession> {
        self.sessions()
            .into_iter()
            .filter(|s| s.date >= from && s.date <= to)
            .collect()
    }

    /// # Errors
    /// Returns an error if the store write fails.
    pub fn append_session(&self, session: StudySession) -> Result<()> {
        self.append_sessions(vec![session]).map(|_| ())
    }

    /// Appends a batch in a single write and returns how many were added.
    ///
    /// # Errors
    /// Returns an error if the store write fails.
    pub fn append_sessions(&self, batch: Vec<StudySession>) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let added = batch.len();
        let mut all = self.sessions();
        all.extend(batch);
        self.store.set_list(SESSIONS_KEY, &all)?;
        tracing::debug!(added, total = all.len(), "sessions appended");
        Ok(added)
    }

    /// Removes the session with `id`. Returns whether anything was removed.
    ///
    /// # Errors
    /// Returns an error if the store write fails.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let mut all = self.sessions();
        let before = all.len();
        all.retain(|s| s.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.store.set_list(SESSIONS_KEY, &all)?;
        Ok(true)
    }

    /// # Errors
    /// Returns an error if the store write fails.
    pub fn append_break(&self, record: BreakRecord) -> Result<()> {
        let mut all = self.breaks();
        all.push(record);
        self.store.set_list(BREAKS_KEY, &all)?;
        Ok(())
    }

    /// Distinct trimmed subjects, in order of first appearance.
    pub fn subjects(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for session in self.sessions() {
            let subject = session.subject.trim();
            if !subject.is_empty() && !out.iter().any(|s| s == subject) {
                out.push(subject.to_string());
            }
        }
        out
    }

    /// Moves every session (recorded or planned) filed under `from` to `to`
    /// and returns how many were rewritten.
    ///
    /// # Errors
    /// Returns a validation error if `from` is not a recorded subject, `to` is
    /// blank or both are the same; otherwise an error if the store write fails.
    pub fn rename_subject(&self, from: &str, to: &str) -> Result<usize> {
        let (from, to) = (from.trim(), to.trim());
        let invalid = |message: &str| ValidationError::InvalidValue {
            field: "subject".into(),
            message: message.into(),
        };
        if to.is_empty() {
            return Err(invalid("the new name is empty").into());
        }
        if to == from {
            return Err(invalid("the new name is the same as the old one").into());
        }
        let mut all = self.sessions();
        let mut renamed = 0;
        for session in all.iter_mut().filter(|s| s.subject.trim() == from) {
            session.subject = to.to_string();
            renamed += 1;
        }
        if renamed == 0 {
            return Err(invalid(&format!("no session is filed under '{from}'")).into());
        }
        self.store.set_list(SESSIONS_KEY, &all)?;
        tracing::info!(from, to, renamed, "subject renamed");
        Ok(renamed)
    }

    /// Drops every session and break.
    ///
    /// # Errors
    /// Returns an error if the store write fails.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(SESSIONS_KEY)?;
        self.store.remove(BREAKS_KEY)?;
        Ok(())
    }
}
