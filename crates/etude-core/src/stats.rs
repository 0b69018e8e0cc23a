//! Study statistics.
//!
//! Pure reductions over recorded sessions and breaks. Calendar-based
//! reductions (weekday, streak, active days) take the time zone that defines
//! a "day"; the CLI passes `chrono::Local`.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::records::{BreakRecord, StudySession};

/// Label used for sessions recorded without a subject.
pub const UNSPECIFIED_SUBJECT: &str = "Non spécifié";

/// Floor of the recommended daily goal, in minutes.
pub const MIN_DAILY_GOAL: u32 = 60;

pub fn total_minutes(sessions: &[StudySession]) -> u32 {
    sessions.iter().map(|s| s.duration).sum()
}

/// Total divided by `days`, rounded. Zero days gives zero.
pub fn average_per_day(sessions: &[StudySession], days: u32) -> u32 {
    if days == 0 {
        return 0;
    }
    (f64::from(total_minutes(sessions)) / f64::from(days)).round() as u32
}

fn subject_key(session: &StudySession) -> &str {
    let subject = session.subject.trim();
    if subject.is_empty() {
        UNSPECIFIED_SUBJECT
    } else {
        subject
    }
}

pub fn minutes_by_subject(sessions: &[StudySession]) -> HashMap<String, u32> {
    let mut out = HashMap::new();
    for session in sessions {
        *out.entry(subject_key(session).to_string()).or_insert(0) += session.duration;
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectShare {
    pub subject: String,
    pub minutes: u32,
    /// Share of total time, one decimal.
    pub percentage: f64,
}

/// The `limit` subjects with the most time, largest first. Ties sort by name.
pub fn top_subjects(sessions: &[StudySession], limit: usize) -> Vec<SubjectShare> {
    let by_subject = minutes_by_subject(sessions);
    let total: u32 = by_subject.values().sum();
    let mut shares: Vec<SubjectShare> = by_subject
        .into_iter()
        .map(|(subject, minutes)| SubjectShare {
            percentage: if total > 0 {
                (f64::from(minutes) * 1000.0 / f64::from(total)).round() / 10.0
            } else {
                0.0
            },
            subject,
            minutes,
        })
        .collect();
    shares.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.subject.cmp(&b.subject)));
    shares.truncate(limit);
    shares
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayStats {
    pub weekday: Weekday,
    pub count: u32,
    pub minutes: u32,
}

impl WeekdayStats {
    /// Short French day name.
    pub fn label(&self) -> &'static str {
        match self.weekday {
            Weekday::Mon => "Lun",
            Weekday::Tue => "Mar",
            Weekday::Wed => "Mer",
            Weekday::Thu => "Jeu",
            Weekday::Fri => "Ven",
            Weekday::Sat => "Sam",
            Weekday::Sun => "Dim",
        }
    }
}

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Session count and minutes per weekday, Sunday first.
pub fn by_weekday<Tz: TimeZone>(sessions: &[StudySession], tz: &Tz) -> Vec<WeekdayStats> {
    let mut days: Vec<WeekdayStats> = SUNDAY_FIRST
        .iter()
        .map(|&weekday| WeekdayStats {
            weekday,
            count: 0,
            minutes: 0,
        })
        .collect();
    for session in sessions {
        let idx = session.date.with_timezone(tz).weekday().num_days_from_sunday() as usize;
        days[idx].count += 1;
        days[idx].minutes += session.duration;
    }
    days
}

fn study_days<Tz: TimeZone>(sessions: &[StudySession], tz: &Tz) -> BTreeSet<NaiveDate> {
    sessions
        .iter()
        .map(|s| s.date.with_timezone(tz).date_naive())
        .collect()
}

/// Consecutive days with at least one session, counting back from `today`.
/// A day without study today breaks the streak.
pub fn streak<Tz: TimeZone>(sessions: &[StudySession], today: NaiveDate, tz: &Tz) -> u32 {
    let days = study_days(sessions, tz);
    let mut count = 0;
    let mut day = today;
    while days.contains(&day) {
        count += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    /// Absolute percentage change, rounded.
    pub change_pct: u32,
    pub direction: TrendDirection,
    pub current_total: u32,
    pub previous_total: u32,
}

/// Compare two weeks of sessions. No study in the previous week reads as stable.
pub fn weekly_trend(current: &[StudySession], previous: &[StudySession]) -> Trend {
    let current_total = total_minutes(current);
    let previous_total = total_minutes(previous);
    if previous_total == 0 {
        return Trend {
            change_pct: 0,
            direction: TrendDirection::Stable,
            current_total,
            previous_total,
        };
    }
    let change = ((f64::from(current_total) - f64::from(previous_total))
        / f64::from(previous_total)
        * 100.0)
        .round() as i64;
    let direction = match change.signum() {
        1 => TrendDirection::Up,
        -1 => TrendDirection::Down,
        _ => TrendDirection::Stable,
    };
    Trend {
        change_pct: change.unsigned_abs() as u32,
        direction,
        current_total,
        previous_total,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGoal {
    pub current: u32,
    pub recommended: u32,
    pub increase: u32,
}

/// Daily goal 20% above the last week's daily average, never below an hour.
/// `sessions` should cover the last seven days.
pub fn recommended_goal(sessions: &[StudySession]) -> DailyGoal {
    let current = average_per_day(sessions, 7);
    // ceil(current * 1.2)
    let raised = (current * 6).div_ceil(5);
    DailyGoal {
        current,
        recommended: raised.max(MIN_DAILY_GOAL),
        increase: raised.saturating_sub(current),
    }
}

/// Headline numbers for a set of sessions and breaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_minutes: u32,
    pub sessions: usize,
    pub average_session_minutes: u32,
    pub active_days: usize,
    pub exams: usize,
    pub breaks: usize,
    pub break_minutes: u32,
}

impl Summary {
    pub fn of<Tz: TimeZone>(sessions: &[StudySession], breaks: &[BreakRecord], tz: &Tz) -> Self {
        let total = total_minutes(sessions);
        Self {
            total_minutes: total,
            sessions: sessions.len(),
            average_session_minutes: match u32::try_from(sessions.len()) {
                Ok(n) if n > 0 => (f64::from(total) / f64::from(n)).round() as u32,
                _ => 0,
            },
            active_days: study_days(sessions, tz).len(),
            exams: sessions.iter().filter(|s| s.is_exam).count(),
            breaks: breaks.len(),
            break_minutes: breaks.iter().map(|b| b.duration).sum(),
        }
    }
}

/// Length of the "month" analytics range, in days.
pub const MONTH_DAYS: u32 = 30;

/// Start of a range covering the last `days` local calendar days, today
/// included, as a UTC instant. One day is the start of today.
pub fn period_start<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz, days: u32) -> DateTime<Utc> {
    let first = now.with_timezone(tz).date_naive() - Duration::days(i64::from(days.max(1)) - 1);
    let midnight = first.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Start of the local day containing `now`, and the start of the six days
/// before it, as UTC instants.
pub fn day_and_week_start<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    (period_start(now, tz, 1), period_start(now, tz, 7))
}

/// `1h05`, `45min`, `2h`.
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, m) => format!("{m}min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m:02}"),
    }
}
