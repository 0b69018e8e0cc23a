//! Turns a finished (or stopped) countdown into at most one persisted record.
//!
//! Break countdowns are logged straight away. Focus countdowns hand back a
//! [`PendingSubject`] that must be answered with a subject before anything is
//! written; the token is consumed on submit, so one completion can never be
//! recorded twice.

use std::error::Error;
use std::sync::Arc;

use chrono::{Duration, Local};

use crate::clock::Clock;
use crate::error::Result;
use crate::records::{BreakRecord, StudySession};
use crate::storage::{Config, SessionLog};
use crate::timer::TimerMode;

/// Sounds the front end may play around completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// A countdown finished.
    Ding,
    /// The user chose to take a break.
    Break,
    /// The user chose to keep working.
    Notification,
}

/// Fire-and-forget side effects. Failures are logged and dropped.
pub trait Notifier: Send + Sync {
    fn play(&self, sound: SoundKind) -> std::result::Result<(), Box<dyn Error + Send + Sync>>;
}

/// A notifier that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn play(&self, _sound: SoundKind) -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// The two questions asked after a focus countdown.
pub trait CompletionPrompt {
    /// Subject studied during `duration_minutes`. Blank means "use the fallback".
    fn ask_subject(&mut self, duration_minutes: u32) -> String;

    /// `true` to keep working, `false` to take a break.
    fn ask_continue_or_break(&mut self) -> bool;
}

/// A focus countdown waiting for its subject.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending subject records nothing until it is submitted"]
pub struct PendingSubject {
    duration_minutes: u32,
    mode: TimerMode,
}

impl PendingSubject {
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }
}

#[derive(Debug, PartialEq)]
pub enum CompletionOutcome {
    BreakRecorded(BreakRecord),
    AwaitingSubject(PendingSubject),
    /// Nothing elapsed, nothing to record.
    Nothing,
}

/// What a full prompt round trip ended with.
#[derive(Debug, PartialEq)]
pub struct Resolution {
    pub session: Option<StudySession>,
    pub break_record: Option<BreakRecord>,
    /// Mode to load next, when the continue-or-break question was asked.
    pub next_mode: Option<TimerMode>,
}

pub struct SessionCoordinator {
    log: SessionLog,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    fallback_subject: String,
    long_break_every: u32,
}

impl SessionCoordinator {
    pub fn new(
        log: SessionLog,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        Self {
            log,
            clock,
            notifier,
            fallback_subject: config.sessions.fallback_subject.clone(),
            long_break_every: config.timer.long_break_every,
        }
    }

    /// Handle a countdown that ran out after `elapsed_minutes`.
    ///
    /// # Errors
    /// Returns an error if a break record cannot be written.
    pub fn on_countdown_complete(
        &self,
        mode: TimerMode,
        elapsed_minutes: u32,
    ) -> Result<CompletionOutcome> {
        self.play(SoundKind::Ding);
        self.handle(mode, elapsed_minutes)
    }

    /// Handle a countdown the user stopped early. Identical to a natural
    /// completion once elapsed minutes are known, minus the sound.
    ///
    /// # Errors
    /// Returns an error if a break record cannot be written.
    pub fn on_early_stop(&self, mode: TimerMode, elapsed_minutes: u32) -> Result<CompletionOutcome> {
        if elapsed_minutes == 0 {
            return Ok(CompletionOutcome::Nothing);
        }
        self.handle(mode, elapsed_minutes)
    }

    fn handle(&self, mode: TimerMode, elapsed_minutes: u32) -> Result<CompletionOutcome> {
        match mode.break_kind() {
            Some(kind) => {
                let record = BreakRecord::new(kind, elapsed_minutes, self.clock.now());
                self.log.append_break(record.clone())?;
                tracing::info!(?kind, minutes = elapsed_minutes, "break recorded");
                Ok(CompletionOutcome::BreakRecorded(record))
            }
            None => Ok(CompletionOutcome::AwaitingSubject(PendingSubject {
                duration_minutes: elapsed_minutes,
                mode,
            })),
        }
    }

    /// Persist the session for `pending`, dated back to when it started.
    ///
    /// # Errors
    /// Returns an error if the session cannot be written.
    pub fn submit_subject(&self, pending: PendingSubject, subject: &str) -> Result<StudySession> {
        let subject = match subject.trim() {
            "" => self.fallback_subject.clone(),
            trimmed => trimmed.to_string(),
        };
        let start = self.clock.now() - Duration::minutes(pending.duration_minutes as i64);
        let session = StudySession::recorded(subject, pending.duration_minutes, start);
        self.log.append_session(session.clone())?;
        tracing::info!(
            subject = %session.subject,
            minutes = session.duration,
            "study session recorded"
        );
        Ok(session)
    }

    /// Map the continue-or-break answer to the next timer mode.
    ///
    /// Keeping on returns the focus mode just finished. A break is long once
    /// every `long_break_every` focus sessions recorded today.
    pub fn choose_next(&self, finished: TimerMode, continue_working: bool) -> TimerMode {
        if continue_working {
            self.play(SoundKind::Notification);
            return if finished.is_break() {
                TimerMode::Pomodoro
            } else {
                finished
            };
        }
        self.play(SoundKind::Break);
        let today = self.clock.now().with_timezone(&Local).date_naive();
        let done_today = self
            .log
            .sessions()
            .iter()
            .filter(|s| !s.is_generated() && s.date.with_timezone(&Local).date_naive() == today)
            .count() as u32;
        if self.long_break_every > 0 && done_today > 0 && done_today % self.long_break_every == 0 {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        }
    }

    /// Drive both prompts for `outcome` and record the result.
    ///
    /// # Errors
    /// Returns an error if the session cannot be written.
    pub fn resolve(
        &self,
        outcome: CompletionOutcome,
        prompt: &mut dyn CompletionPrompt,
    ) -> Result<Resolution> {
        match outcome {
            CompletionOutcome::Nothing => Ok(Resolution {
                session: None,
                break_record: None,
                next_mode: None,
            }),
            CompletionOutcome::BreakRecorded(record) => Ok(Resolution {
                session: None,
                break_record: Some(record),
                next_mode: None,
            }),
            CompletionOutcome::AwaitingSubject(pending) => {
                let mode = pending.mode();
                let subject = prompt.ask_subject(pending.duration_minutes());
                let session = self.submit_subject(pending, &subject)?;
                let next_mode = self.choose_next(mode, prompt.ask_continue_or_break());
                Ok(Resolution {
                    session: Some(session),
                    break_record: None,
                    next_mode: Some(next_mode),
                })
            }
        }
    }

    fn play(&self, sound: SoundKind) {
        if let Err(e) = self.notifier.play(sound) {
            tracing::debug!(?sound, error = %e, "sound playback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::records::BreakKind;
    use crate::storage::MemoryStore;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        played: Mutex<Vec<SoundKind>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn play(&self, sound: SoundKind) -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
            self.played.lock().unwrap().push(sound);
            if self.fail {
                return Err("no audio device".into());
            }
            Ok(())
        }
    }

    struct Scripted {
        subject: &'static str,
        keep_working: bool,
        asked: Vec<u32>,
    }

    impl CompletionPrompt for Scripted {
        fn ask_subject(&mut self, duration_minutes: u32) -> String {
            self.asked.push(duration_minutes);
            self.subject.to_string()
        }

        fn ask_continue_or_break(&mut self) -> bool {
            self.keep_working
        }
    }

    fn noon() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-04T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn setup(notifier: Arc<RecordingNotifier>) -> (SessionCoordinator, SessionLog, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(noon()));
        let log = SessionLog::new(Arc::new(MemoryStore::new()));
        let coordinator =
            SessionCoordinator::new(log.clone(), clock.clone(), notifier, &Config::default());
        (coordinator, log, clock)
    }

    #[test]
    fn focus_completion_waits_for_subject() {
        let (coordinator, log, _clock) = setup(Arc::default());
        let outcome = coordinator
            .on_countdown_complete(TimerMode::Pomodoro, 25)
            .unwrap();
        let CompletionOutcome::AwaitingSubject(pending) = outcome else {
            panic!("expected a subject prompt");
        };
        assert!(log.sessions().is_empty());

        let session = coordinator.submit_subject(pending, "Histoire").unwrap();
        assert_eq!(session.subject, "Histoire");
        assert_eq!(session.duration, 25);
        assert_eq!(session.date, noon() - Duration::minutes(25));
        assert_eq!(log.sessions(), vec![session]);
    }

    #[test]
    fn blank_subject_uses_fallback() {
        let (coordinator, log, _clock) = setup(Arc::default());
        let CompletionOutcome::AwaitingSubject(pending) =
            coordinator.on_countdown_complete(TimerMode::Custom, 50).unwrap()
        else {
            panic!("expected a subject prompt");
        };
        coordinator.submit_subject(pending, "   ").unwrap();
        assert_eq!(log.sessions()[0].subject, "Session de travail");
    }

    #[test]
    fn break_completion_records_break_without_prompt() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (coordinator, log, _clock) = setup(notifier.clone());
        let outcome = coordinator
            .on_countdown_complete(TimerMode::ShortBreak, 5)
            .unwrap();
        assert!(matches!(outcome, CompletionOutcome::BreakRecorded(ref r) if r.kind == BreakKind::ShortBreak));
        assert_eq!(log.breaks().len(), 1);
        assert_eq!(log.breaks()[0].duration, 5);
        assert!(log.sessions().is_empty());
        assert_eq!(*notifier.played.lock().unwrap(), vec![SoundKind::Ding]);
    }

    #[test]
    fn early_stop_follows_completion_path() {
        let (coordinator, log, _clock) = setup(Arc::default());
        assert_eq!(
            coordinator.on_early_stop(TimerMode::Pomodoro, 0).unwrap(),
            CompletionOutcome::Nothing
        );
        assert!(matches!(
            coordinator.on_early_stop(TimerMode::Pomodoro, 8).unwrap(),
            CompletionOutcome::AwaitingSubject(ref p) if p.duration_minutes() == 8
        ));
        assert!(matches!(
            coordinator.on_early_stop(TimerMode::LongBreak, 3).unwrap(),
            CompletionOutcome::BreakRecorded(_)
        ));
        assert_eq!(log.breaks()[0].kind, BreakKind::LongBreak);
    }

    #[test]
    fn sound_failures_are_swallowed() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let (coordinator, log, _clock) = setup(notifier);
        coordinator
            .on_countdown_complete(TimerMode::ShortBreak, 5)
            .unwrap();
        assert_eq!(log.breaks().len(), 1);
    }

    #[test]
    fn resolve_runs_both_prompts() {
        let (coordinator, log, _clock) = setup(Arc::default());
        let outcome = coordinator
            .on_countdown_complete(TimerMode::Custom, 40)
            .unwrap();
        let mut prompt = Scripted {
            subject: "Chimie",
            keep_working: true,
            asked: Vec::new(),
        };
        let resolution = coordinator.resolve(outcome, &mut prompt).unwrap();
        assert_eq!(prompt.asked, vec![40]);
        assert_eq!(resolution.next_mode, Some(TimerMode::Custom));
        assert_eq!(resolution.session.unwrap().subject, "Chimie");
        assert_eq!(log.sessions().len(), 1);
    }

    #[test]
    fn every_fourth_session_earns_a_long_break() {
        let (coordinator, _log, _clock) = setup(Arc::default());
        let mut modes = Vec::new();
        for _ in 0..4 {
            let CompletionOutcome::AwaitingSubject(pending) =
                coordinator.on_countdown_complete(TimerMode::Pomodoro, 25).unwrap()
            else {
                panic!("expected a subject prompt");
            };
            coordinator.submit_subject(pending, "Math").unwrap();
            modes.push(coordinator.choose_next(TimerMode::Pomodoro, false));
        }
        assert_eq!(
            modes,
            vec![
                TimerMode::ShortBreak,
                TimerMode::ShortBreak,
                TimerMode::ShortBreak,
                TimerMode::LongBreak
            ]
        );
    }
}
