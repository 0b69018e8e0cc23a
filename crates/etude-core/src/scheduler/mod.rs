//! Weekly study planner.
//!
//! Spreads the hours required per study item over the allowed days of a date
//! range, largest remaining item first:
//! - at most `sessions_per_day` blocks per day, each capped at two hours
//! - the k-th block of a day starts `floor(k / sessions_per_day * window)` hours
//!   into the daily window, so blocks are spread out rather than packed
//! - whatever does not fit is reported as unscheduled minutes, not an error

mod request;

pub use request::{parse_weekdays, ScheduleRequest, StudyItem};

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{StudySession, GENERATED_DESCRIPTION};

/// Longest block the planner will place, in minutes.
pub const MAX_SESSION_MINUTES: u32 = 120;

/// Result of a planning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    pub sessions: Vec<StudySession>,
    pub unscheduled_minutes: u64,
}

/// Per-subject totals of a generated schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub subject: String,
    pub sessions: usize,
    pub minutes: u32,
}

impl ScheduleOutcome {
    pub fn scheduled_minutes(&self) -> u64 {
        self.sessions.iter().map(|s| u64::from(s.duration)).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.unscheduled_minutes == 0
    }

    /// Human-readable warning when some time could not be placed.
    pub fn shortfall_message(&self) -> Option<String> {
        if self.is_complete() {
            return None;
        }
        let hours = self.unscheduled_minutes / 60;
        let mins = self.unscheduled_minutes % 60;
        Some(format!(
            "{hours}h{mins:02}min of study could not be scheduled; \
             widen the date range, allow more days or more sessions per day \
             (blocks are capped at {}h)",
            MAX_SESSION_MINUTES / 60
        ))
    }

    /// Totals per subject, in order of first appearance.
    pub fn summary(&self) -> Vec<SubjectSummary> {
        let mut out: Vec<SubjectSummary> = Vec::new();
        for session in &self.sessions {
            match out.iter_mut().find(|s| s.subject == session.subject) {
                Some(entry) => {
                    entry.sessions += 1;
                    entry.minutes += session.duration;
                }
                None => out.push(SubjectSummary {
                    subject: session.subject.clone(),
                    sessions: 1,
                    minutes: session.duration,
                }),
            }
        }
        out
    }
}

/// Plan `request` in the local time zone.
pub fn generate_schedule(request: &ScheduleRequest) -> ScheduleOutcome {
    generate_schedule_in(request, &chrono::Local)
}

/// Plan `request`, placing block start hours in `tz`.
pub fn generate_schedule_in<Tz: TimeZone>(request: &ScheduleRequest, tz: &Tz) -> ScheduleOutcome {
    let mut remaining: Vec<u32> = request.items.iter().map(StudyItem::minutes).collect();
    let total = sum_minutes(&remaining);

    let (Some(start), Some(end)) = (request.start_date, request.end_date) else {
        tracing::warn!("planning skipped: date range is missing");
        return ScheduleOutcome {
            sessions: Vec::new(),
            unscheduled_minutes: total,
        };
    };

    let dates = candidate_dates(request, start, end);
    let per_day = request.sessions_per_day;
    let span = request
        .window_end_hour
        .saturating_sub(request.window_start_hour) as u64;
    tracing::debug!(days = dates.len(), total_minutes = total, per_day, "planning");

    let mut sessions = Vec::new();
    for date in dates {
        for k in 0..per_day {
            let Some(idx) = largest_remaining(&remaining) else {
                break;
            };
            let duration = remaining[idx].min(MAX_SESSION_MINUTES);
            let offset = (k as u64 * span / per_day as u64) as u32;
            let hour = (request.window_start_hour + offset).min(23);

            sessions.push(StudySession {
                id: format!("gen-{}", uuid::Uuid::new_v4()),
                date: block_start(tz, date, hour),
                subject: request.items[idx].name.clone(),
                description: GENERATED_DESCRIPTION.to_string(),
                duration,
                start_time: Some(format!("{hour:02}:00")),
                is_exam: false,
            });
            remaining[idx] -= duration;
        }
        if remaining.iter().all(|m| *m == 0) {
            break;
        }
    }

    let outcome = ScheduleOutcome {
        sessions,
        unscheduled_minutes: sum_minutes(&remaining),
    };
    tracing::info!(
        sessions = outcome.sessions.len(),
        scheduled_minutes = outcome.scheduled_minutes(),
        "schedule generated"
    );
    if let Some(warning) = outcome.shortfall_message() {
        tracing::warn!(unscheduled_minutes = outcome.unscheduled_minutes, "{warning}");
    }
    outcome
}

/// Allowed dates in `[start, end]`, oldest first.
fn candidate_dates(request: &ScheduleRequest, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| request.weekdays.contains(&d.weekday()))
        .collect()
}

/// Total of per-item minutes; each item may be close to `u32::MAX`.
fn sum_minutes(minutes: &[u32]) -> u64 {
    minutes.iter().map(|m| u64::from(*m)).sum()
}

/// Index of the item with the most minutes left; the first listed wins ties.
fn largest_remaining(remaining: &[u32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, &minutes) in remaining.iter().enumerate() {
        if minutes == 0 {
            continue;
        }
        match best {
            Some(b) if remaining[b] >= minutes => {}
            _ => best = Some(idx),
        }
    }
    best
}

fn block_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> chrono::DateTime<Utc> {
    let naive = date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN));
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Hour skipped by a DST jump: read the wall time as UTC.
        None => Utc.from_utc_datetime(&naive),
    }
}
