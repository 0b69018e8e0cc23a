//! Countdown engine implementation.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads - the owner calls `tick()` periodically (see `CountdownDriver`).
//! Remaining time is always derived from `(start_from, anchor, now)`, never from
//! counted ticks, so throttled or skipped polls self-correct.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> (Completed) -> Idle     completion reported once per start()
//! * -> reset() -> Idle               never reports completion
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let Restored { mut engine, pending } = CountdownEngine::restore(25, clock, Some(store));
//! engine.start();
//! // In a loop:
//! engine.tick(); // Returns Some(Event::TimerCompleted) when the countdown ends
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::events::Event;
use crate::storage::{KvStore, TIMER_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Persisted form of the countdown, written after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub time_left_ms: u64,
    pub is_running: bool,
    pub is_paused: bool,
    pub initial_minutes: u32,
    /// Wall-clock anchor (epoch ms), set only while running.
    #[serde(default)]
    pub start_timestamp_ms: Option<i64>,
    pub start_from_ms: u64,
    /// Full length of the current run, including added time.
    pub cycle_ms: u64,
}

/// Result of mounting an engine from the store.
pub struct Restored {
    pub engine: CountdownEngine,
    /// Completion that happened while nothing was running. The caller dispatches
    /// it once mounting is done.
    pub pending: Option<Event>,
}

/// Core countdown engine.
pub struct CountdownEngine {
    state: TimerState,
    initial_minutes: u32,
    time_left_ms: u64,
    start_from_ms: u64,
    cycle_ms: u64,
    anchor_ms: Option<i64>,
    /// Set when completion is reported; cleared only by `start()`.
    completion_latched: bool,
    clock: Arc<dyn Clock>,
    store: Option<Arc<dyn KvStore>>,
}

impl fmt::Debug for CountdownEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownEngine")
            .field("state", &self.state)
            .field("initial_minutes", &self.initial_minutes)
            .field("time_left_ms", &self.time_left_ms)
            .field("start_from_ms", &self.start_from_ms)
            .field("anchor_ms", &self.anchor_ms)
            .field("completion_latched", &self.completion_latched)
            .finish()
    }
}

fn minutes_to_ms(minutes: u32) -> u64 {
    (minutes as u64).saturating_mul(60_000)
}

/// Whole minutes studied, rounding partial minutes up after flooring to seconds.
fn elapsed_minutes_from_ms(elapsed_ms: u64) -> u32 {
    let secs = elapsed_ms / 1000;
    secs.div_ceil(60).min(u32::MAX as u64) as u32
}

impl CountdownEngine {
    /// Create an idle engine loaded with `initial_minutes`.
    ///
    /// With a store attached, every mutation re-persists the snapshot.
    pub fn new(
        initial_minutes: u32,
        clock: Arc<dyn Clock>,
        store: Option<Arc<dyn KvStore>>,
    ) -> Self {
        let full = minutes_to_ms(initial_minutes);
        Self {
            state: TimerState::Idle,
            initial_minutes,
            time_left_ms: full,
            start_from_ms: full,
            cycle_ms: full,
            anchor_ms: None,
            completion_latched: false,
            clock,
            store,
        }
    }

    /// Mount from the persisted snapshot, reconciling time spent away.
    ///
    /// A missing or corrupt snapshot yields a fresh idle engine. Nothing is
    /// persisted during this pass.
    pub fn restore(
        initial_minutes: u32,
        clock: Arc<dyn Clock>,
        store: Option<Arc<dyn KvStore>>,
    ) -> Restored {
        let snapshot = store.as_ref().and_then(|s| read_snapshot(s.as_ref()));
        let mut engine = Self::new(initial_minutes, clock, store);
        let Some(snap) = snapshot else {
            return Restored {
                engine,
                pending: None,
            };
        };

        engine.initial_minutes = snap.initial_minutes;
        let now = engine.clock.now_ms();

        match (snap.is_running, snap.is_paused, snap.start_timestamp_ms) {
            (true, false, Some(anchor)) => {
                let away_ms = now.saturating_sub(anchor).max(0) as u64;
                engine.cycle_ms = snap.cycle_ms;
                if away_ms >= snap.start_from_ms {
                    tracing::info!(away_ms, "countdown finished while away");
                    let pending = engine.finish(false);
                    return Restored {
                        engine,
                        pending: Some(pending),
                    };
                }
                let left = snap.start_from_ms - away_ms;
                engine.state = TimerState::Running;
                engine.start_from_ms = left;
                engine.time_left_ms = left;
                engine.anchor_ms = Some(now);
                tracing::debug!(time_left_ms = left, "resumed running countdown");
            }
            (false, true, _) => {
                engine.state = TimerState::Paused;
                engine.time_left_ms = snap.time_left_ms;
                engine.start_from_ms = snap.time_left_ms;
                engine.cycle_ms = snap.cycle_ms.max(snap.time_left_ms);
                tracing::debug!(time_left_ms = snap.time_left_ms, "restored paused countdown");
            }
            (false, false, _) => {
                engine.time_left_ms = snap.time_left_ms;
                engine.start_from_ms = snap.time_left_ms;
                engine.cycle_ms = snap.time_left_ms;
            }
            _ => {
                tracing::warn!(?snap, "inconsistent timer snapshot, starting fresh");
                engine = Self::new(engine.initial_minutes, engine.clock, engine.store);
            }
        }

        Restored {
            engine,
            pending: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn initial_minutes(&self) -> u32 {
        self.initial_minutes
    }

    /// Remaining time, derived from the wall clock while running.
    pub fn time_left_ms(&self) -> u64 {
        match (self.state, self.anchor_ms) {
            (TimerState::Running, Some(anchor)) => {
                let elapsed = self.clock.now_ms().saturating_sub(anchor).max(0) as u64;
                self.start_from_ms.saturating_sub(elapsed)
            }
            _ => self.time_left_ms,
        }
    }

    /// Remaining whole seconds, rounded up so a fresh 25 min countdown shows 25:00.
    pub fn time_left_secs(&self) -> u64 {
        self.time_left_ms().div_ceil(1000)
    }

    /// Whole minutes studied in the current run so far.
    pub fn elapsed_minutes(&self) -> u32 {
        elapsed_minutes_from_ms(self.cycle_ms.saturating_sub(self.time_left_ms()))
    }

    /// 0.0 .. 100.0 progress within the current run.
    pub fn progress_pct(&self) -> f64 {
        if self.cycle_ms == 0 {
            return 0.0;
        }
        let done = self.cycle_ms.saturating_sub(self.time_left_ms()) as f64;
        (done / self.cycle_ms as f64 * 100.0).min(100.0)
    }

    /// `MM:SS`, minutes not capped at 59.
    pub fn format_time(&self) -> String {
        let secs = self.time_left_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            time_left_ms: self.time_left_ms(),
            is_running: self.state == TimerState::Running,
            is_paused: self.state == TimerState::Paused,
            initial_minutes: self.initial_minutes,
            start_timestamp_ms: self.anchor_ms,
            start_from_ms: self.start_from_ms,
            cycle_ms: self.cycle_ms,
        }
    }

    /// Build a full state snapshot event.
    pub fn state_event(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            time_left_ms: self.time_left_ms(),
            initial_minutes: self.initial_minutes,
            progress_pct: self.progress_pct(),
            display: self.format_time(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or re-anchor) the countdown and re-arm completion reporting.
    pub fn start(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        match self.state {
            TimerState::Idle => {
                if self.time_left_ms == 0 {
                    self.time_left_ms = minutes_to_ms(self.initial_minutes);
                }
                self.cycle_ms = self.time_left_ms;
            }
            TimerState::Running => {
                self.time_left_ms = self.time_left_ms();
            }
            TimerState::Paused => {}
        }
        self.start_from_ms = self.time_left_ms;
        self.anchor_ms = Some(now);
        self.state = TimerState::Running;
        self.completion_latched = false;
        self.persist();
        tracing::debug!(time_left_ms = self.time_left_ms, "countdown started");
        Some(Event::TimerStarted {
            time_left_ms: self.time_left_ms,
            at: self.clock.now(),
        })
    }

    /// Freeze the remaining time. Does nothing unless running.
    ///
    /// If the countdown already ran out, this completes it instead.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let left = self.time_left_ms();
        if left == 0 {
            return self.complete();
        }
        self.time_left_ms = left;
        self.start_from_ms = left;
        self.anchor_ms = None;
        self.state = TimerState::Paused;
        self.persist();
        Some(Event::TimerPaused {
            time_left_ms: left,
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        self.start_from_ms = self.time_left_ms;
        self.anchor_ms = Some(self.clock.now_ms());
        self.persist();
        Some(Event::TimerResumed {
            time_left_ms: self.time_left_ms,
            at: self.clock.now(),
        })
    }

    /// Recompute remaining time. Returns `Some(Event::TimerCompleted)` once when
    /// the countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.time_left_ms = self.time_left_ms();
        if self.time_left_ms == 0 {
            return self.complete();
        }
        None
    }

    /// Stop and reload with `minutes`. Returns the whole minutes studied when
    /// `report_progress` is set, else 0. Never reports completion.
    pub fn reset(&mut self, minutes: u32, report_progress: bool) -> u32 {
        let elapsed = if report_progress && self.state != TimerState::Idle {
            self.elapsed_minutes()
        } else {
            0
        };
        let full = minutes_to_ms(minutes);
        self.state = TimerState::Idle;
        self.initial_minutes = minutes;
        self.time_left_ms = full;
        self.start_from_ms = full;
        self.cycle_ms = full;
        self.anchor_ms = None;
        self.clear_persisted();
        tracing::debug!(minutes, elapsed, "countdown reset");
        elapsed
    }

    /// Like `reset`, wrapped as an event.
    pub fn reset_event(&mut self, minutes: u32, report_progress: bool) -> Event {
        let elapsed_minutes = self.reset(minutes, report_progress);
        Event::TimerReset {
            minutes,
            elapsed_minutes,
            at: self.clock.now(),
        }
    }

    /// Extend the current run (or the next one, when idle) by `minutes`.
    pub fn add_minutes(&mut self, minutes: u32) -> Option<Event> {
        if minutes == 0 {
            return None;
        }
        let extra = minutes_to_ms(minutes);
        if self.state == TimerState::Running {
            self.time_left_ms = self.time_left_ms();
            self.start_from_ms = self.time_left_ms;
            self.anchor_ms = Some(self.clock.now_ms());
        }
        self.time_left_ms = self.time_left_ms.saturating_add(extra);
        self.start_from_ms = self.time_left_ms;
        self.cycle_ms = self.cycle_ms.saturating_add(extra);
        self.persist();
        Some(Event::TimeAdded {
            minutes,
            time_left_ms: self.time_left_ms,
            at: self.clock.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Option<Event> {
        if self.completion_latched {
            self.state = TimerState::Idle;
            self.anchor_ms = None;
            return None;
        }
        Some(self.finish(true))
    }

    /// Return to idle at full length and latch the completion.
    fn finish(&mut self, log_live: bool) -> Event {
        let elapsed_minutes = elapsed_minutes_from_ms(self.cycle_ms);
        let full = minutes_to_ms(self.initial_minutes);
        self.state = TimerState::Idle;
        self.time_left_ms = full;
        self.start_from_ms = full;
        self.cycle_ms = full;
        self.anchor_ms = None;
        self.completion_latched = true;
        self.clear_persisted();
        if log_live {
            tracing::info!(elapsed_minutes, "countdown completed");
        }
        Event::TimerCompleted {
            elapsed_minutes,
            at: self.clock.now(),
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let result = serde_json::to_string(&self.snapshot())
            .map_err(|e| e.to_string())
            .and_then(|json| store.set(TIMER_KEY, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist timer snapshot");
        }
    }

    fn clear_persisted(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.remove(TIMER_KEY) {
                tracing::warn!(error = %e, "failed to clear timer snapshot");
            }
        }
    }
}

fn read_snapshot(store: &dyn KvStore) -> Option<TimerSnapshot> {
    let raw = match store.get(TIMER_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read timer snapshot");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(snap) => Some(snap),
        Err(e) => {
            tracing::warn!(error = %e, "corrupt timer snapshot, starting fresh");
            None
        }
    }
}
