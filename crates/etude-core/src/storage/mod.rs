pub mod config;
pub mod courses;
pub mod database;
pub mod links;
mod memory;
pub mod session_log;
pub mod tasks;

pub use config::Config;
pub use courses::CourseBook;
pub use database::Database;
pub use links::LinkList;
pub use memory::MemoryStore;
pub use session_log::SessionLog;
pub use tasks::TaskList;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorageError};

/// Key holding the `StudySession` list.
pub const SESSIONS_KEY: &str = "studySessions";
/// Key holding the `BreakRecord` list.
pub const BREAKS_KEY: &str = "breaks";
/// Key holding the countdown snapshot.
pub const TIMER_KEY: &str = "studyTimerState";
/// Key holding the `Course` list.
pub const COURSES_KEY: &str = "etudes_courses";
/// Key holding the `Task` list.
pub const TASKS_KEY: &str = "tasks";
/// Key holding the `Link` list.
pub const LINKS_KEY: &str = "links";

/// Every list a profile holds. The countdown snapshot and loaded mode are not
/// part of it.
pub const DATA_KEYS: [&str; 5] = [SESSIONS_KEY, BREAKS_KEY, COURSES_KEY, TASKS_KEY, LINKS_KEY];

/// Removes every list in [`DATA_KEYS`].
///
/// # Errors
/// Returns an error if a removal fails; keys already removed stay removed.
pub fn clear_all_data(store: &dyn KvStore) -> Result<()> {
    for key in DATA_KEYS {
        store.remove(key)?;
    }
    tracing::info!("all study data cleared");
    Ok(())
}

/// Returns `~/.config/etude[-dev]/` based on ETUDE_ENV.
///
/// Set ETUDE_ENV=dev to use development data directory, or ETUDE_DATA_DIR to
/// point at an explicit directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("ETUDE_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ETUDE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("etude-dev")
            } else {
                base_dir.join("etude")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Durable string key-value persistence.
///
/// One `set` is atomic; nothing spans several keys.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed list access on top of any [`KvStore`].
pub trait ListStore {
    /// Returns `[]` when the key is absent or holds something unparseable.
    fn get_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T>;

    /// Replaces the whole list stored under `key`.
    ///
    /// # Errors
    /// Returns an error if serialization or the underlying write fails.
    fn set_list<T: Serialize>(&self, key: &str, records: &[T]) -> Result<()>;
}

impl<S: KvStore + ?Sized> ListStore for S {
    fn get_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read list, using empty list");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(key, error = %e, "unparseable list, using empty list");
                Vec::new()
            }
        }
    }

    fn set_list<T: Serialize>(&self, key: &str, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.set(key, &json)?;
        Ok(())
    }
}
