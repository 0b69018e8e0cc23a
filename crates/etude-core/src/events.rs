use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every countdown transition produces an Event.
/// The front end prints or renders them; completion events drive the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero. Emitted at most once per `start()`.
    TimerCompleted {
        elapsed_minutes: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        minutes: u32,
        /// Whole minutes studied before the reset, when progress was requested.
        elapsed_minutes: u32,
        at: DateTime<Utc>,
    },
    TimeAdded {
        minutes: u32,
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        time_left_ms: u64,
        initial_minutes: u32,
        progress_pct: f64,
        display: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. })
    }
}
