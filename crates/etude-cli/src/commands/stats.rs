use chrono::{Duration, Local, Utc};
use clap::Subcommand;
use etude_core::stats::{self, Summary};
use serde_json::json;

use super::{open_log, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// The last seven days, with trend and recommended goal
    Week,
    /// The last thirty days
    Month,
    /// All-time stats
    All,
}

pub fn run(action: StatsAction) -> CliResult {
    let log = open_log()?;
    let now = Utc::now();
    let (day_start, week_start) = stats::day_and_week_start(now, &Local);
    let today = now.with_timezone(&Local).date_naive();

    match action {
        StatsAction::Today => {
            let sessions = log.sessions_between(day_start, now);
            let breaks: Vec<_> = log
                .breaks()
                .into_iter()
                .filter(|b| b.date >= day_start && b.date <= now)
                .collect();
            print_json(&json!({
                "summary": Summary::of(&sessions, &breaks, &Local),
                "topSubjects": stats::top_subjects(&sessions, 3),
                "streak": stats::streak(&log.sessions(), today, &Local),
                "total": stats::format_minutes(stats::total_minutes(&sessions)),
            }))?;
        }
        StatsAction::Week => {
            let sessions = log.sessions_between(week_start, now);
            let previous = log.sessions_between(
                week_start - Duration::days(7),
                week_start - Duration::milliseconds(1),
            );
            let breaks: Vec<_> = log
                .breaks()
                .into_iter()
                .filter(|b| b.date >= week_start && b.date <= now)
                .collect();
            let weekdays: Vec<_> = stats::by_weekday(&sessions, &Local)
                .into_iter()
                .map(|d| json!({ "day": d.label(), "count": d.count, "minutes": d.minutes }))
                .collect();
            print_json(&json!({
                "summary": Summary::of(&sessions, &breaks, &Local),
                "averagePerDay": stats::average_per_day(&sessions, 7),
                "byWeekday": weekdays,
                "topSubjects": stats::top_subjects(&sessions, 3),
                "trend": stats::weekly_trend(&sessions, &previous),
                "goal": stats::recommended_goal(&sessions),
            }))?;
        }
        StatsAction::Month => {
            let month_start = stats::period_start(now, &Local, stats::MONTH_DAYS);
            let sessions = log.sessions_between(month_start, now);
            let breaks: Vec<_> = log
                .breaks()
                .into_iter()
                .filter(|b| b.date >= month_start && b.date <= now)
                .collect();
            print_json(&json!({
                "summary": Summary::of(&sessions, &breaks, &Local),
                "averagePerDay": stats::average_per_day(&sessions, stats::MONTH_DAYS),
                "minutesBySubject": stats::minutes_by_subject(&sessions),
                "topSubjects": stats::top_subjects(&sessions, 3),
                "total": stats::format_minutes(stats::total_minutes(&sessions)),
            }))?;
        }
        StatsAction::All => {
            let sessions = log.sessions();
            let breaks = log.breaks();
            print_json(&json!({
                "summary": Summary::of(&sessions, &breaks, &Local),
                "topSubjects": stats::top_subjects(&sessions, 5),
                "streak": stats::streak(&sessions, today, &Local),
                "total": stats::format_minutes(stats::total_minutes(&sessions)),
            }))?;
        }
    }
    Ok(())
}
