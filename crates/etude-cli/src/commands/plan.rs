use chrono::NaiveDate;
use clap::Subcommand;
use etude_core::scheduler::{generate_schedule, parse_weekdays, ScheduleRequest, StudyItem};
use etude_core::storage::Config;
use serde_json::json;

use super::{open_log, print_json, CliResult};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Spread study hours over a date range and record the planned sessions
    Generate {
        /// Item to plan, as NAME=HOURS (repeatable)
        #[arg(long = "item", required = true)]
        items: Vec<StudyItem>,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: NaiveDate,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: NaiveDate,
        /// Allowed days, e.g. "mon,wed,fri" or "lundi,mercredi"
        #[arg(long, default_value = "mon,tue,wed,thu,fri")]
        days: String,
        /// Daily window as START-END hours, e.g. "9-17" (default from config)
        #[arg(long)]
        window: Option<String>,
        /// Blocks per day (default from config)
        #[arg(long)]
        per_day: Option<u32>,
        /// Print the plan without recording it
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_window(raw: &str) -> CliResult<(u32, u32)> {
    let (start, end) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected START-END hours, got '{raw}'"))?;
    Ok((start.trim().parse()?, end.trim().parse()?))
}

pub fn run(action: PlanAction) -> CliResult {
    match action {
        PlanAction::Generate {
            items,
            from,
            to,
            days,
            window,
            per_day,
            dry_run,
        } => {
            let config = Config::load_or_default();
            let (window_start_hour, window_end_hour) = match window {
                Some(raw) => parse_window(&raw)?,
                None => (
                    config.planner.window_start_hour,
                    config.planner.window_end_hour,
                ),
            };
            let request = ScheduleRequest {
                items,
                start_date: Some(from),
                end_date: Some(to),
                weekdays: parse_weekdays(&days)?,
                window_start_hour,
                window_end_hour,
                sessions_per_day: per_day.unwrap_or(config.planner.sessions_per_day),
            };
            request.validate()?;

            let outcome = generate_schedule(&request);
            if let Some(warning) = outcome.shortfall_message() {
                eprintln!("warning: {warning}");
            }
            let recorded = if dry_run {
                0
            } else {
                open_log()?.append_sessions(outcome.sessions.clone())?
            };
            print_json(&json!({
                "sessions": outcome.sessions,
                "summary": outcome.summary(),
                "scheduledMinutes": outcome.scheduled_minutes(),
                "unscheduledMinutes": outcome.unscheduled_minutes,
                "recorded": recorded,
            }))?;
        }
    }
    Ok(())
}
