//! Integration tests for the countdown -> coordinator -> store workflow.

use std::sync::Arc;
use std::time::Duration;

use etude_core::clock::{Clock, ManualClock};
use etude_core::coordinator::{
    CompletionOutcome, CompletionPrompt, SessionCoordinator, SilentNotifier,
};
use etude_core::storage::{Config, Database, KvStore, SessionLog};
use etude_core::timer::{CountdownDriver, CountdownEngine, TimerMode};
use etude_core::{BreakKind, Event};

struct Answers {
    subject: &'static str,
    keep_working: bool,
}

impl CompletionPrompt for Answers {
    fn ask_subject(&mut self, _duration_minutes: u32) -> String {
        self.subject.to_string()
    }

    fn ask_continue_or_break(&mut self) -> bool {
        self.keep_working
    }
}

struct Fixture {
    clock: Arc<ManualClock>,
    store: Arc<dyn KvStore>,
    log: SessionLog,
    coordinator: SessionCoordinator,
}

fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::at_ms(1_772_000_000_000));
    let store: Arc<dyn KvStore> = Arc::new(Database::open_memory().unwrap());
    let log = SessionLog::new(store.clone());
    let coordinator = SessionCoordinator::new(
        log.clone(),
        clock.clone() as Arc<dyn Clock>,
        Arc::new(SilentNotifier),
        &Config::default(),
    );
    Fixture {
        clock,
        store,
        log,
        coordinator,
    }
}

fn elapsed_of(event: &Event) -> u32 {
    match event {
        Event::TimerCompleted {
            elapsed_minutes, ..
        } => *elapsed_minutes,
        other => panic!("expected a completion, got {other:?}"),
    }
}

#[test]
fn test_pomodoro_completion_records_one_session() {
    let fx = fixture();
    let mut engine = CountdownEngine::new(25, fx.clock.clone(), Some(fx.store.clone()));
    engine.start();
    fx.clock.advance_secs(25 * 60);

    let event = engine.tick().expect("countdown finished");
    assert!(engine.tick().is_none());

    let outcome = fx
        .coordinator
        .on_countdown_complete(TimerMode::Pomodoro, elapsed_of(&event))
        .unwrap();
    let resolution = fx
        .coordinator
        .resolve(
            outcome,
            &mut Answers {
                subject: "Histoire",
                keep_working: false,
            },
        )
        .unwrap();

    let sessions = fx.log.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].subject, "Histoire");
    assert_eq!(sessions[0].duration, 25);
    assert_eq!(
        sessions[0].date,
        fx.clock.now() - chrono::Duration::minutes(25)
    );
    assert_eq!(resolution.next_mode, Some(TimerMode::ShortBreak));
    assert!(fx.log.breaks().is_empty());
}

#[test]
fn test_break_completion_records_break_only() {
    let fx = fixture();
    let mut engine = CountdownEngine::new(5, fx.clock.clone(), Some(fx.store.clone()));
    engine.start();
    fx.clock.advance_secs(5 * 60 + 3);
    let event = engine.tick().expect("countdown finished");

    let outcome = fx
        .coordinator
        .on_countdown_complete(TimerMode::ShortBreak, elapsed_of(&event))
        .unwrap();
    assert!(matches!(outcome, CompletionOutcome::BreakRecorded(_)));
    let breaks = fx.log.breaks();
    assert_eq!(breaks.len(), 1);
    assert_eq!(breaks[0].kind, BreakKind::ShortBreak);
    assert_eq!(breaks[0].duration, 5);
    assert!(fx.log.sessions().is_empty());
}

#[test]
fn test_early_stop_of_focus_records_rounded_minutes() {
    let fx = fixture();
    let mut engine = CountdownEngine::new(50, fx.clock.clone(), Some(fx.store.clone()));
    engine.start();
    fx.clock.advance_secs(12 * 60 + 1);

    let elapsed = engine.reset(50, true);
    assert_eq!(elapsed, 13);
    let outcome = fx
        .coordinator
        .on_early_stop(TimerMode::Custom, elapsed)
        .unwrap();
    let resolution = fx
        .coordinator
        .resolve(
            outcome,
            &mut Answers {
                subject: "",
                keep_working: true,
            },
        )
        .unwrap();
    assert_eq!(resolution.next_mode, Some(TimerMode::Custom));
    let session = resolution.session.unwrap();
    assert_eq!(session.subject, "Session de travail");
    assert_eq!(session.duration, 13);
}

#[tokio::test(start_paused = true)]
async fn test_driver_delivers_completion_to_coordinator() {
    let fx = fixture();
    let engine = CountdownEngine::new(1, fx.clock.clone(), Some(fx.store.clone()));
    let mut driver = CountdownDriver::new(engine, Duration::from_millis(100));
    driver.start();

    let clock = fx.clock.clone();
    let waiter = async {
        tokio::time::sleep(Duration::from_millis(250)).await;
        clock.advance_secs(61);
    };
    let (event, ()) = tokio::join!(driver.next_completion(), waiter);
    let event = event.expect("completion");

    let outcome = fx
        .coordinator
        .on_countdown_complete(TimerMode::Pomodoro, elapsed_of(&event))
        .unwrap();
    let CompletionOutcome::AwaitingSubject(pending) = outcome else {
        panic!("expected a subject prompt");
    };
    fx.coordinator.submit_subject(pending, "Math").unwrap();
    assert_eq!(fx.log.sessions().len(), 1);
    assert!(!driver.is_polling());
}
