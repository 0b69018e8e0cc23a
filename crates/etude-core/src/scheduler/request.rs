use std::collections::HashSet;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};

use crate::error::ValidationError;

/// Something to study and how long it needs in total.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyItem {
    pub name: String,
    pub hours_required: f64,
}

impl StudyItem {
    pub fn new(name: impl Into<String>, hours_required: f64) -> Self {
        Self {
            name: name.into(),
            hours_required,
        }
    }

    /// Required time in whole minutes; negative or NaN hours count as zero.
    pub fn minutes(&self) -> u32 {
        let minutes = (self.hours_required * 60.0).round();
        if minutes.is_finite() && minutes > 0.0 {
            minutes.min(u32::MAX as f64) as u32
        } else {
            0
        }
    }
}

/// Parses `Name=hours`, e.g. `Math=10` or `Histoire=2.5`.
impl FromStr for StudyItem {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: "item".into(),
            message,
        };
        let (name, hours) = s
            .rsplit_once('=')
            .ok_or_else(|| invalid(format!("expected NAME=HOURS, got '{s}'")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid(format!("missing name in '{s}'")));
        }
        let hours: f64 = hours
            .trim()
            .parse()
            .map_err(|_| invalid(format!("cannot parse hours in '{s}'")))?;
        Ok(Self::new(name, hours))
    }
}

/// Input of a planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    pub items: Vec<StudyItem>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub weekdays: HashSet<Weekday>,
    pub window_start_hour: u32,
    pub window_end_hour: u32,
    pub sessions_per_day: u32,
}

impl ScheduleRequest {
    pub fn total_minutes(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.minutes())).sum()
    }

    /// Reject input the planner would silently misread.
    ///
    /// Planning itself never fails; this is for front ends collecting input.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.window_end_hour > 24 || self.window_start_hour >= self.window_end_hour {
            return Err(ValidationError::InvalidWindow {
                start: self.window_start_hour,
                end: self.window_end_hour,
            });
        }
        if self.items.is_empty() {
            return Err(ValidationError::EmptyCollection("study items".into()));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ValidationError::InvalidDateRange { start, end });
            }
        }
        if let Some(item) = self
            .items
            .iter()
            .find(|i| !i.hours_required.is_finite() || i.hours_required < 0.0)
        {
            return Err(ValidationError::InvalidValue {
                field: "hours_required".into(),
                message: format!("'{}' needs a non-negative number of hours", item.name),
            });
        }
        Ok(())
    }
}

/// Parses a comma-separated weekday list such as `mon,wed,fri` (English or
/// French names, full or abbreviated).
///
/// # Errors
/// Returns an error naming the first unknown day.
pub fn parse_weekdays(list: &str) -> Result<HashSet<Weekday>, ValidationError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|day| {
            let french = match day.to_lowercase().as_str() {
                "lundi" | "lun" => Some(Weekday::Mon),
                "mardi" | "mar" => Some(Weekday::Tue),
                "mercredi" | "mer" => Some(Weekday::Wed),
                "jeudi" | "jeu" => Some(Weekday::Thu),
                "vendredi" | "ven" => Some(Weekday::Fri),
                "samedi" | "sam" => Some(Weekday::Sat),
                "dimanche" | "dim" => Some(Weekday::Sun),
                _ => None,
            };
            french
                .map(Ok)
                .unwrap_or_else(|| day.parse::<Weekday>())
                .map_err(|_| ValidationError::InvalidValue {
                    field: "weekdays".into(),
                    message: format!("unknown day '{day}'"),
                })
        })
        .collect()
}
