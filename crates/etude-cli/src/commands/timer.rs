use std::io::{BufRead, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use etude_core::clock::{Clock, SystemClock};
use etude_core::coordinator::{
    CompletionOutcome, CompletionPrompt, Notifier, SessionCoordinator, SoundKind,
};
use etude_core::storage::{Config, KvStore, SessionLog};
use etude_core::timer::{CountdownDriver, CountdownEngine, Restored, TimerMode, TimerState};
use etude_core::Event;
use serde_json::json;

use super::{open_store, print_json, CliResult};

/// Key holding the loaded timer mode. Kept apart from the countdown snapshot,
/// which is cleared on every reset and completion.
const MODE_KEY: &str = "timerMode";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or restart) the countdown
    Start {
        #[command(flatten)]
        answers: Answers,
    },
    /// Pause the countdown
    Pause {
        #[command(flatten)]
        answers: Answers,
    },
    /// Resume a paused countdown
    Resume,
    /// Print the current countdown state as JSON
    Status {
        #[command(flatten)]
        answers: Answers,
    },
    /// Add minutes to the current (or next) countdown
    Add {
        /// Minutes to add
        minutes: u32,
    },
    /// Load another timer mode (pomodoro, short-break, long-break, custom)
    Mode {
        mode: TimerMode,
        /// Length of the custom countdown, 1 to 120 minutes
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Stop and reload the current mode
    Reset {
        /// Record the time already studied
        #[arg(long)]
        save: bool,
        #[command(flatten)]
        answers: Answers,
    },
    /// Follow the running countdown until it completes
    Watch {
        #[command(flatten)]
        answers: Answers,
    },
}

/// Answers to the completion prompts, for non-interactive use.
#[derive(Args, Debug, Clone, Default)]
pub struct Answers {
    /// Subject to record when a study countdown finishes
    #[arg(long)]
    subject: Option<String>,
    /// What to do after recording a session
    #[arg(long, value_enum)]
    next: Option<NextStep>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum NextStep {
    Continue,
    Break,
}

/// Rings the terminal bell.
struct BellNotifier {
    enabled: bool,
}

impl Notifier for BellNotifier {
    fn play(&self, sound: SoundKind) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.enabled || sound != SoundKind::Ding {
            return Ok(());
        }
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

/// Reads prompt answers from flags first, then from stdin when it is a
/// terminal. Without either, the subject is left blank and work continues.
struct StdinPrompt<'a> {
    answers: &'a Answers,
    interactive: bool,
}

impl StdinPrompt<'_> {
    fn read_line(&self, question: &str) -> String {
        if !self.interactive {
            return String::new();
        }
        eprint!("{question}");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
            tracing::debug!(error = %e, "could not read answer");
        }
        line.trim().to_string()
    }
}

impl CompletionPrompt for StdinPrompt<'_> {
    fn ask_subject(&mut self, duration_minutes: u32) -> String {
        match &self.answers.subject {
            Some(subject) => subject.clone(),
            None => self.read_line(&format!(
                "Session de {duration_minutes} min terminée. Matière étudiée : "
            )),
        }
    }

    fn ask_continue_or_break(&mut self) -> bool {
        if let Some(next) = self.answers.next {
            return next == NextStep::Continue;
        }
        let answer = self.read_line("Continuer [c] ou faire une pause [p] ? ");
        !matches!(
            answer.to_lowercase().as_str(),
            "p" | "pause" | "b" | "break"
        )
    }
}

/// Everything one invocation needs around the restored engine.
struct TimerContext {
    store: Arc<dyn KvStore>,
    config: Config,
    coordinator: SessionCoordinator,
    mode: TimerMode,
}

impl TimerContext {
    fn open() -> CliResult<(Self, Restored)> {
        let config = Config::load_or_default();
        let store = open_store()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let mode = load_mode(store.as_ref());
        let restored =
            CountdownEngine::restore(config.minutes_for(mode), clock.clone(), Some(store.clone()));
        let notifier = Arc::new(BellNotifier {
            enabled: config.notifications.enabled,
        });
        let coordinator =
            SessionCoordinator::new(SessionLog::new(store.clone()), clock, notifier, &config);
        Ok((
            Self {
                store,
                config,
                coordinator,
                mode,
            },
            restored,
        ))
    }

    /// Record a finished countdown and ask what comes next.
    fn settle(&mut self, engine: &mut CountdownEngine, event: &Event, answers: &Answers) -> CliResult {
        let Event::TimerCompleted {
            elapsed_minutes, ..
        } = event
        else {
            return Ok(());
        };
        let outcome = self
            .coordinator
            .on_countdown_complete(self.mode, *elapsed_minutes)?;
        self.resolve(engine, outcome, answers)
    }

    fn resolve(
        &mut self,
        engine: &mut CountdownEngine,
        outcome: CompletionOutcome,
        answers: &Answers,
    ) -> CliResult {
        let mut prompt = StdinPrompt {
            answers,
            interactive: std::io::stdin().is_terminal(),
        };
        let resolution = self.coordinator.resolve(outcome, &mut prompt)?;
        if let Some(record) = &resolution.break_record {
            print_json(&json!({ "type": "BreakRecorded", "break": record }))?;
        }
        if let Some(session) = &resolution.session {
            print_json(&json!({ "type": "SessionRecorded", "session": session }))?;
        }
        if let Some(next) = resolution.next_mode {
            self.switch_mode(engine, next)?;
        }
        Ok(())
    }

    fn switch_mode(&mut self, engine: &mut CountdownEngine, mode: TimerMode) -> CliResult {
        self.mode = mode;
        self.store.set(MODE_KEY, &serde_json::to_string(&mode)?)?;
        let event = engine.reset_event(self.config.minutes_for(mode), false);
        print_json(&json!({ "type": "ModeChanged", "mode": mode, "label": mode.label() }))?;
        print_json(&event)?;
        Ok(())
    }
}

fn load_mode(store: &dyn KvStore) -> TimerMode {
    match store.get(MODE_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "unreadable timer mode, using pomodoro");
            TimerMode::default()
        }),
        Ok(None) => TimerMode::default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read timer mode");
            TimerMode::default()
        }
    }
}

fn print_event(event: Option<Event>, engine: &CountdownEngine) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&engine.state_event()),
    }
}

fn watch(engine: CountdownEngine, poll_every: Duration) -> CliResult<(CountdownEngine, Option<Event>)> {
    if engine.state() != TimerState::Running {
        return Ok((engine, None));
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let (engine, completed) = runtime.block_on(async move {
        let mut driver = CountdownDriver::new(engine, poll_every);
        let mut shown = String::new();
        let completed = loop {
            if let Some(event) = driver.poll_once().await {
                break Some(event);
            }
            if !driver.is_polling() {
                break None;
            }
            let display = driver.engine().format_time();
            if display != shown {
                eprint!("\r{display} ");
                let _ = std::io::stderr().flush();
                shown = display;
            }
        };
        eprintln!();
        (driver.into_engine(), completed)
    });
    Ok((engine, completed))
}

pub fn run(action: TimerAction) -> CliResult {
    let (mut ctx, Restored { mut engine, pending }) = TimerContext::open()?;

    // A countdown that ran out while nothing was watching.
    if let Some(event) = pending {
        print_json(&event)?;
        let answers = match &action {
            TimerAction::Start { answers }
            | TimerAction::Pause { answers }
            | TimerAction::Status { answers }
            | TimerAction::Reset { answers, .. }
            | TimerAction::Watch { answers } => answers.clone(),
            _ => Answers::default(),
        };
        ctx.settle(&mut engine, &event, &answers)?;
    }

    match action {
        TimerAction::Start { .. } => {
            let event = engine.start();
            print_event(event, &engine)?;
        }
        TimerAction::Pause { answers } => match engine.pause() {
            Some(event) if event.is_completion() => {
                print_json(&event)?;
                ctx.settle(&mut engine, &event, &answers)?;
            }
            event => print_event(event, &engine)?,
        },
        TimerAction::Resume => {
            let event = engine.resume();
            print_event(event, &engine)?;
        }
        TimerAction::Status { answers } => {
            let completed = engine.tick();
            print_json(&json!({ "mode": ctx.mode, "label": ctx.mode.label() }))?;
            print_json(&engine.state_event())?;
            if let Some(event) = completed {
                print_json(&event)?;
                ctx.settle(&mut engine, &event, &answers)?;
            }
        }
        TimerAction::Add { minutes } => {
            let event = engine.add_minutes(minutes);
            print_event(event, &engine)?;
        }
        TimerAction::Mode { mode, minutes } => {
            if engine.state() != TimerState::Idle {
                return Err("stop the timer (timer reset) before changing mode".into());
            }
            if let Some(minutes) = minutes {
                if mode != TimerMode::Custom || !(1..=120).contains(&minutes) {
                    return Err("--minutes applies to the custom mode and must be 1 to 120".into());
                }
                ctx.config.set("timer.custom_minutes", &minutes.to_string())?;
            }
            ctx.switch_mode(&mut engine, mode)?;
        }
        TimerAction::Reset { save, answers } => {
            let minutes = ctx.config.minutes_for(ctx.mode);
            let event = engine.reset_event(minutes, save);
            print_json(&event)?;
            if let Event::TimerReset {
                elapsed_minutes, ..
            } = event
            {
                if save {
                    let outcome = ctx.coordinator.on_early_stop(ctx.mode, elapsed_minutes)?;
                    ctx.resolve(&mut engine, outcome, &answers)?;
                }
            }
        }
        TimerAction::Watch { answers } => {
            let poll_every = Duration::from_millis(ctx.config.timer.poll_interval_ms.max(10));
            let (mut watched, completed) = watch(engine, poll_every)?;
            match completed {
                Some(event) => {
                    print_json(&event)?;
                    ctx.settle(&mut watched, &event, &answers)?;
                }
                None => print_json(&watched.state_event())?,
            }
        }
    }
    Ok(())
}
