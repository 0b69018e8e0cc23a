use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::Subcommand;
use etude_core::records::StudySession;
use etude_core::stats::format_minutes;
use etude_core::storage::{self, CourseBook, SessionLog};
use serde_json::json;

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List recorded sessions, oldest first
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a session by hand
    Add {
        #[arg(long)]
        subject: String,
        /// Minutes studied
        #[arg(long)]
        duration: u32,
        /// Start, as "YYYY-MM-DD" or "YYYY-MM-DD HH:MM" local time (default: now)
        #[arg(long)]
        date: Option<String>,
        /// Mark the session as an exam
        #[arg(long)]
        exam: bool,
    },
    /// Delete a session by id
    Delete { id: String },
    /// List the subjects sessions are filed under
    Subjects,
    /// Rename a subject across every session and its course
    Rename { from: String, to: String },
    /// Delete every session and break
    Clear {
        /// Also delete courses, tasks and links
        #[arg(long)]
        everything: bool,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn parse_start(raw: &str) -> CliResult<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").or_else(|_| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| format!("'{raw}' does not exist in the local time zone").into())
}

pub fn run(action: SessionAction) -> CliResult {
    let store = open_store()?;
    let log = SessionLog::new(store.clone());

    match action {
        SessionAction::List { json } => {
            let mut sessions = log.sessions();
            sessions.sort_by_key(|s| s.date);
            if json {
                return print_json(&sessions);
            }
            for s in &sessions {
                let local = s.date.with_timezone(&Local);
                let exam = if s.is_exam { " [examen]" } else { "" };
                let planned = if s.is_generated() { " (planifié)" } else { "" };
                println!(
                    "{}  {}  {:>6}  {}{exam}{planned}",
                    s.id,
                    local.format("%Y-%m-%d %H:%M"),
                    format_minutes(s.duration),
                    s.subject,
                );
            }
        }
        SessionAction::Add {
            subject,
            duration,
            date,
            exam,
        } => {
            if subject.trim().is_empty() || duration == 0 {
                return Err("a session needs a subject and a positive duration".into());
            }
            let start = match date {
                Some(raw) => parse_start(&raw)?,
                None => Utc::now(),
            };
            let mut session = StudySession::recorded(subject.trim(), duration, start);
            session.is_exam = exam;
            log.append_session(session.clone())?;
            print_json(&session)?;
        }
        SessionAction::Delete { id } => {
            if !log.delete_session(&id)? {
                return Err(format!("no session with id '{id}'").into());
            }
            println!("deleted {id}");
        }
        SessionAction::Subjects => print_json(&log.subjects())?,
        SessionAction::Rename { from, to } => {
            let sessions = log.rename_subject(&from, &to)?;
            let course = CourseBook::new(store).rename(from.trim(), to.trim())?;
            print_json(&json!({
                "from": from.trim(),
                "to": to.trim(),
                "sessions": sessions,
                "courseRenamed": course,
            }))?;
        }
        SessionAction::Clear { everything, yes } => {
            if !yes {
                return Err("this deletes recorded data; pass --yes to confirm".into());
            }
            if everything {
                storage::clear_all_data(store.as_ref())?;
            } else {
                log.clear()?;
            }
            print_json(&json!({ "cleared": true, "everything": everything }))?;
        }
    }
    Ok(())
}
