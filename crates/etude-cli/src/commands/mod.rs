pub mod config;
pub mod course;
pub mod link;
pub mod plan;
pub mod session;
pub mod stats;
pub mod task;
pub mod timer;

use std::sync::Arc;

use etude_core::storage::{Database, KvStore, SessionLog};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Open the profile database as a shared store.
pub fn open_store() -> CliResult<Arc<dyn KvStore>> {
    Ok(Arc::new(Database::open()?))
}

pub fn open_log() -> CliResult<SessionLog> {
    Ok(SessionLog::new(open_store()?))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
