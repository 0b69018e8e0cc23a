use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::records::BreakKind;

/// Which kind of countdown is loaded.
///
/// Focus kinds (`Pomodoro`, `Custom`) are attributed to a subject when they
/// finish; break kinds are logged as breaks without asking anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    #[default]
    Pomodoro,
    ShortBreak,
    LongBreak,
    Custom,
}

impl TimerMode {
    pub const ALL: [TimerMode; 4] = [
        TimerMode::Pomodoro,
        TimerMode::ShortBreak,
        TimerMode::LongBreak,
        TimerMode::Custom,
    ];

    pub fn is_break(self) -> bool {
        self.break_kind().is_some()
    }

    pub fn break_kind(self) -> Option<BreakKind> {
        match self {
            TimerMode::ShortBreak => Some(BreakKind::ShortBreak),
            TimerMode::LongBreak => Some(BreakKind::LongBreak),
            TimerMode::Pomodoro | TimerMode::Custom => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Pomodoro => "Focus",
            TimerMode::ShortBreak => "Pause courte",
            TimerMode::LongBreak => "Pause longue",
            TimerMode::Custom => "Personnalisé",
        }
    }

    fn key(self) -> &'static str {
        match self {
            TimerMode::Pomodoro => "pomodoro",
            TimerMode::ShortBreak => "shortBreak",
            TimerMode::LongBreak => "longBreak",
            TimerMode::Custom => "custom",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "pomodoro" | "focus" => Ok(TimerMode::Pomodoro),
            "shortbreak" | "short" => Ok(TimerMode::ShortBreak),
            "longbreak" | "long" => Ok(TimerMode::LongBreak),
            "custom" => Ok(TimerMode::Custom),
            _ => Err(format!(
                "unknown timer mode '{s}' (expected pomodoro, short-break, long-break or custom)"
            )),
        }
    }
}
