//! Basic CLI E2E tests.
//!
//! Tests run the built `etude` binary against a throwaway data directory and
//! inspect the JSON it prints.

use std::path::Path;
use std::process::Command;

use etude_core::storage::{Database, KvStore, TIMER_KEY};
use etude_core::timer::TimerSnapshot;
use serde_json::Value;

struct Run {
    stdout: String,
    stderr: String,
    code: i32,
}

impl Run {
    /// Every JSON document printed on stdout.
    fn documents(&self) -> Vec<Value> {
        serde_json::Deserializer::from_str(&self.stdout)
            .into_iter::<Value>()
            .collect::<Result<_, _>>()
            .expect("stdout is a JSON stream")
    }

    fn of_type(&self, ty: &str) -> Option<Value> {
        self.documents().into_iter().find(|d| d["type"] == ty)
    }
}

fn run_cli(dir: &Path, args: &[&str]) -> Run {
    let output = Command::new(env!("CARGO_BIN_EXE_etude"))
        .args(args)
        .env("ETUDE_DATA_DIR", dir)
        .env_remove("ETUDE_LOG")
        .output()
        .expect("Failed to execute CLI command");

    Run {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        code: output.status.code().unwrap_or(-1),
    }
}

fn run_ok(dir: &Path, args: &[&str]) -> Run {
    let run = run_cli(dir, args);
    assert_eq!(run.code, 0, "{args:?} failed: {}", run.stderr);
    run
}

fn state_of(run: &Run) -> Value {
    run.of_type("StateSnapshot").expect("a state snapshot")
}

#[test]
fn test_fresh_timer_is_idle_pomodoro() {
    let tmp = tempfile::tempdir().unwrap();
    let run = run_ok(tmp.path(), &["timer", "status"]);
    let docs = run.documents();
    assert_eq!(docs[0]["mode"], "pomodoro");
    let state = state_of(&run);
    assert_eq!(state["state"], "idle");
    assert_eq!(state["display"], "25:00");
}

#[test]
fn test_start_pause_resume_survive_between_invocations() {
    let tmp = tempfile::tempdir().unwrap();
    let started = run_ok(tmp.path(), &["timer", "start"]);
    assert!(started.of_type("TimerStarted").is_some());

    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(state_of(&status)["state"], "running");

    let paused = run_ok(tmp.path(), &["timer", "pause"]);
    assert!(paused.of_type("TimerPaused").is_some());
    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(state_of(&status)["state"], "paused");

    let resumed = run_ok(tmp.path(), &["timer", "resume"]);
    assert!(resumed.of_type("TimerResumed").is_some());
}

fn write_snapshot(dir: &Path, snapshot: &TimerSnapshot) {
    let db = Database::open_at(&dir.join("etude.db")).unwrap();
    db.set(TIMER_KEY, &serde_json::to_string(snapshot).unwrap())
        .unwrap();
}

#[test]
fn test_plain_reset_discards_progress() {
    let tmp = tempfile::tempdir().unwrap();
    run_ok(tmp.path(), &["timer", "start"]);
    let reset = run_ok(tmp.path(), &["timer", "reset"]);
    let event = reset.of_type("TimerReset").unwrap();
    assert_eq!(event["elapsed_minutes"], 0);
    assert!(reset.of_type("SessionRecorded").is_none());

    let list = run_ok(tmp.path(), &["session", "list", "--json"]);
    assert_eq!(list.documents()[0], Value::Array(vec![]));
    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(state_of(&status)["state"], "idle");
}

#[test]
fn test_saved_reset_records_studied_minutes() {
    let tmp = tempfile::tempdir().unwrap();
    // Paused with 15 of 25 minutes left: 10 minutes studied.
    write_snapshot(
        tmp.path(),
        &TimerSnapshot {
            time_left_ms: 15 * 60_000,
            is_running: false,
            is_paused: true,
            initial_minutes: 25,
            start_timestamp_ms: None,
            start_from_ms: 15 * 60_000,
            cycle_ms: 25 * 60_000,
        },
    );
    let reset = run_ok(
        tmp.path(),
        &["timer", "reset", "--save", "--subject", "Math", "--next", "continue"],
    );
    assert_eq!(reset.of_type("TimerReset").unwrap()["elapsed_minutes"], 10);
    let recorded = reset.of_type("SessionRecorded").expect("recorded session");
    assert_eq!(recorded["session"]["subject"], "Math");
    assert_eq!(recorded["session"]["duration"], 10);
    assert_eq!(reset.of_type("ModeChanged").unwrap()["mode"], "pomodoro");
}

#[test]
fn test_mode_switch_loads_configured_length() {
    let tmp = tempfile::tempdir().unwrap();
    run_ok(tmp.path(), &["timer", "mode", "short-break"]);
    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(status.documents()[0]["mode"], "shortBreak");
    assert_eq!(state_of(&status)["display"], "05:00");

    run_ok(tmp.path(), &["timer", "mode", "custom", "--minutes", "40"]);
    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(state_of(&status)["display"], "40:00");
    let value = run_ok(tmp.path(), &["config", "get", "timer.custom_minutes"]);
    assert_eq!(value.stdout.trim(), "40");

    let bad = run_cli(tmp.path(), &["timer", "mode", "pomodoro", "--minutes", "30"]);
    assert_eq!(bad.code, 1);
    assert!(bad.stderr.contains("error:"));
}

#[test]
fn test_mode_switch_refused_while_countdown_in_flight() {
    let tmp = tempfile::tempdir().unwrap();
    run_ok(tmp.path(), &["timer", "start"]);

    let refused = run_cli(tmp.path(), &["timer", "mode", "short-break"]);
    assert_eq!(refused.code, 1);
    assert!(refused.stderr.contains("before changing mode"));
    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(status.documents()[0]["mode"], "pomodoro");
    assert_eq!(state_of(&status)["state"], "running");

    run_ok(tmp.path(), &["timer", "pause"]);
    let refused = run_cli(tmp.path(), &["timer", "mode", "custom", "--minutes", "40"]);
    assert_eq!(refused.code, 1);
    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(state_of(&status)["state"], "paused");
    assert_eq!(state_of(&status)["initial_minutes"], 25);
    let value = run_ok(tmp.path(), &["config", "get", "timer.custom_minutes"]);
    assert_ne!(value.stdout.trim(), "40");

    run_ok(tmp.path(), &["timer", "reset"]);
    run_ok(tmp.path(), &["timer", "mode", "short-break"]);
    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(state_of(&status)["display"], "05:00");
}

#[test]
fn test_countdown_finished_while_away_is_recorded_once() {
    let tmp = tempfile::tempdir().unwrap();
    let now_ms = chrono::Utc::now().timestamp_millis();
    write_snapshot(
        tmp.path(),
        &TimerSnapshot {
            time_left_ms: 25 * 60_000,
            is_running: true,
            is_paused: false,
            initial_minutes: 25,
            start_timestamp_ms: Some(now_ms - 30 * 60_000),
            start_from_ms: 25 * 60_000,
            cycle_ms: 25 * 60_000,
        },
    );

    let run = run_ok(
        tmp.path(),
        &["timer", "status", "--subject", "Histoire", "--next", "break"],
    );
    let completed = run.of_type("TimerCompleted").expect("completion event");
    assert_eq!(completed["elapsed_minutes"], 25);
    let recorded = run.of_type("SessionRecorded").expect("recorded session");
    assert_eq!(recorded["session"]["subject"], "Histoire");
    assert_eq!(recorded["session"]["duration"], 25);
    let changed = run.of_type("ModeChanged").expect("break loaded");
    assert_eq!(changed["mode"], "shortBreak");

    // Reloading again must not record a second session.
    let again = run_ok(tmp.path(), &["timer", "status"]);
    assert!(again.of_type("TimerCompleted").is_none());
    let list = run_ok(tmp.path(), &["session", "list", "--json"]);
    assert_eq!(list.documents()[0].as_array().unwrap().len(), 1);
}

#[test]
fn test_session_add_list_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let added = run_ok(
        tmp.path(),
        &[
            "session", "add", "--subject", "Chimie", "--duration", "45", "--date",
            "2026-03-02 14:00", "--exam",
        ],
    );
    let session = &added.documents()[0];
    assert_eq!(session["subject"], "Chimie");
    assert_eq!(session["isExam"], true);
    let id = session["id"].as_str().unwrap().to_string();

    let list = run_ok(tmp.path(), &["session", "list"]);
    assert!(list.stdout.contains("Chimie"));
    assert!(list.stdout.contains("45min"));

    run_ok(tmp.path(), &["session", "delete", &id]);
    let missing = run_cli(tmp.path(), &["session", "delete", &id]);
    assert_eq!(missing.code, 1);
}

#[test]
fn test_plan_generate_records_sessions() {
    let tmp = tempfile::tempdir().unwrap();
    let args = [
        "plan", "generate", "--item", "Math=3", "--item", "Histoire=5", "--from", "2026-03-02",
        "--to", "2026-03-08", "--days", "mon,tue,wed", "--window", "9-17", "--per-day", "2",
    ];

    let mut dry = args.to_vec();
    dry.push("--dry-run");
    let preview = run_ok(tmp.path(), &dry);
    let doc = &preview.documents()[0];
    assert_eq!(doc["recorded"], 0);
    assert_eq!(doc["scheduledMinutes"], 480);
    assert_eq!(doc["unscheduledMinutes"], 0);

    let planned = run_ok(tmp.path(), &args);
    assert_eq!(planned.documents()[0]["recorded"], 5);
    let list = run_ok(tmp.path(), &["session", "list", "--json"]);
    let sessions = list.documents()[0].as_array().unwrap().clone();
    assert_eq!(sessions.len(), 5);
    assert!(sessions
        .iter()
        .all(|s| s["description"] == "Généré automatiquement"));
}

#[test]
fn test_plan_shortfall_warns() {
    let tmp = tempfile::tempdir().unwrap();
    let run = run_ok(
        tmp.path(),
        &[
            "plan", "generate", "--item", "Math=10", "--from", "2026-03-02", "--to",
            "2026-03-08", "--days", "wed", "--per-day", "1", "--dry-run",
        ],
    );
    assert_eq!(run.documents()[0]["unscheduledMinutes"], 480);
    assert!(run.stderr.contains("warning:"));
}

#[test]
fn test_plan_rejects_reversed_window() {
    let tmp = tempfile::tempdir().unwrap();
    let run = run_cli(
        tmp.path(),
        &[
            "plan", "generate", "--item", "Math=2", "--from", "2026-03-02", "--to",
            "2026-03-08", "--window", "17-9",
        ],
    );
    assert_eq!(run.code, 1);
    assert!(run.stderr.contains("error:"));
}

#[test]
fn test_stats_on_empty_profile() {
    let tmp = tempfile::tempdir().unwrap();
    for period in ["today", "week", "month", "all"] {
        let run = run_ok(tmp.path(), &["stats", period]);
        assert_eq!(run.documents()[0]["summary"]["totalMinutes"], 0);
    }
    let week = run_ok(tmp.path(), &["stats", "week"]);
    assert_eq!(week.documents()[0]["goal"]["recommended"], 60);
}

#[test]
fn test_config_roundtrip_and_unknown_key() {
    let tmp = tempfile::tempdir().unwrap();
    run_ok(tmp.path(), &["config", "set", "timer.pomodoro_minutes", "30"]);
    let value = run_ok(tmp.path(), &["config", "get", "timer.pomodoro_minutes"]);
    assert_eq!(value.stdout.trim(), "30");
    let status = run_ok(tmp.path(), &["timer", "status"]);
    assert_eq!(state_of(&status)["display"], "30:00");

    let unknown = run_cli(tmp.path(), &["config", "get", "nope"]);
    assert_eq!(unknown.code, 1);
}

#[test]
fn test_course_checklist_flow() {
    let tmp = tempfile::tempdir().unwrap();
    let added = run_ok(
        tmp.path(),
        &["course", "add", "Chimie", "--chapter", "Atomes", "--chapter", "Liaisons"],
    );
    let course = &added.documents()[0];
    let course_id = course["id"].as_str().unwrap().to_string();
    let chapter_id = course["chapters"][0]["id"].as_str().unwrap().to_string();

    let toggled = run_ok(tmp.path(), &["course", "toggle", &course_id, &chapter_id]);
    assert_eq!(toggled.documents()[0]["done"], true);
    run_ok(tmp.path(), &["course", "chapter", &course_id, "Réactions"]);

    let list = run_ok(tmp.path(), &["course", "list"]);
    assert!(list.stdout.contains("Chimie  (1/3)"), "{}", list.stdout);
    assert!(list.stdout.contains("[x]"));

    run_ok(tmp.path(), &["course", "remove", &course_id]);
    let missing = run_cli(tmp.path(), &["course", "toggle", &course_id, &chapter_id]);
    assert_eq!(missing.code, 1);
    let list = run_ok(tmp.path(), &["course", "list", "--json"]);
    assert_eq!(list.documents()[0], Value::Array(vec![]));
}

#[test]
fn test_task_and_link_lists() {
    let tmp = tempfile::tempdir().unwrap();
    let first = run_ok(tmp.path(), &["task", "add", "Relire", "--subject", "Histoire"]);
    let first_id = first.documents()[0]["id"].as_str().unwrap().to_string();
    run_ok(tmp.path(), &["task", "add", "Exercices"]);
    run_ok(tmp.path(), &["task", "done", &first_id]);

    let tasks = run_ok(tmp.path(), &["task", "list", "--json"]);
    let titles: Vec<_> = tasks.documents()[0]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Exercices", "Relire"]);
    run_ok(tmp.path(), &["task", "delete", &first_id]);
    assert_eq!(run_cli(tmp.path(), &["task", "done", &first_id]).code, 1);

    let link = run_ok(tmp.path(), &["link", "add", "Annales", "https://example.org/annales"]);
    let link_id = link.documents()[0]["id"].as_str().unwrap().to_string();
    let links = run_ok(tmp.path(), &["link", "list"]);
    assert!(links.stdout.contains("https://example.org/annales"));
    run_ok(tmp.path(), &["link", "delete", &link_id]);
    assert_eq!(run_cli(tmp.path(), &["link", "delete", &link_id]).code, 1);
}

#[test]
fn test_subject_rename_and_clear() {
    let tmp = tempfile::tempdir().unwrap();
    for subject in ["Maths", "Maths", "Histoire"] {
        run_ok(
            tmp.path(),
            &["session", "add", "--subject", subject, "--duration", "30"],
        );
    }
    run_ok(tmp.path(), &["course", "add", "Maths", "--chapter", "Suites"]);

    let renamed = run_ok(tmp.path(), &["session", "rename", "Maths", "Analyse"]);
    let doc = &renamed.documents()[0];
    assert_eq!(doc["sessions"], 2);
    assert_eq!(doc["courseRenamed"], true);
    let subjects = run_ok(tmp.path(), &["session", "subjects"]);
    assert_eq!(subjects.documents()[0], serde_json::json!(["Analyse", "Histoire"]));
    assert_eq!(
        run_cli(tmp.path(), &["session", "rename", "Maths", "Algèbre"]).code,
        1
    );

    let refused = run_cli(tmp.path(), &["session", "clear"]);
    assert_eq!(refused.code, 1);
    run_ok(tmp.path(), &["session", "clear", "--yes"]);
    let list = run_ok(tmp.path(), &["session", "list", "--json"]);
    assert_eq!(list.documents()[0], Value::Array(vec![]));
    let courses = run_ok(tmp.path(), &["course", "list", "--json"]);
    assert_eq!(courses.documents()[0].as_array().unwrap().len(), 1);

    run_ok(tmp.path(), &["session", "clear", "--everything", "--yes"]);
    let courses = run_ok(tmp.path(), &["course", "list", "--json"]);
    assert_eq!(courses.documents()[0], Value::Array(vec![]));
}

#[test]
fn test_month_stats_cover_thirty_days() {
    let tmp = tempfile::tempdir().unwrap();
    let now = chrono::Local::now();
    let old = (now - chrono::Duration::days(20)).format("%Y-%m-%d").to_string();
    let older = (now - chrono::Duration::days(45)).format("%Y-%m-%d").to_string();
    run_ok(
        tmp.path(),
        &["session", "add", "--subject", "Math", "--duration", "60", "--date", &old],
    );
    run_ok(
        tmp.path(),
        &["session", "add", "--subject", "Math", "--duration", "90", "--date", &older],
    );

    let month = run_ok(tmp.path(), &["stats", "month"]);
    let doc = &month.documents()[0];
    assert_eq!(doc["summary"]["totalMinutes"], 60);
    assert_eq!(doc["averagePerDay"], 2);
    assert_eq!(doc["minutesBySubject"]["Math"], 60);
    let week = run_ok(tmp.path(), &["stats", "week"]);
    assert_eq!(week.documents()[0]["summary"]["totalMinutes"], 0);
}
