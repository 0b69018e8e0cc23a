//! Live countdown loop.
//!
//! `CountdownDriver` owns one engine and at most one [`Ticker`]. Every
//! state-changing call drops the outstanding ticker and, when the engine ends up
//! running, arms a fresh one. Pausing or resetting therefore starves the poll
//! loop of a completion condition without any extra cancellation token.

use std::time::Duration;

use super::engine::{CountdownEngine, TimerState};
use super::ticker::Ticker;
use crate::events::Event;

pub struct CountdownDriver {
    engine: CountdownEngine,
    ticker: Option<Ticker>,
    poll_every: Duration,
}

impl CountdownDriver {
    /// Take ownership of `engine`. A running engine gets a ticker immediately.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(engine: CountdownEngine, poll_every: Duration) -> Self {
        let mut driver = Self {
            engine,
            ticker: None,
            poll_every,
        };
        driver.rearm();
        driver
    }

    pub fn engine(&self) -> &CountdownEngine {
        &self.engine
    }

    pub fn into_engine(self) -> CountdownEngine {
        let Self { engine, .. } = self;
        engine
    }

    pub fn is_polling(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start();
        self.rearm();
        event
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause();
        self.rearm();
        event
    }

    pub fn resume(&mut self) -> Option<Event> {
        let event = self.engine.resume();
        self.rearm();
        event
    }

    pub fn reset(&mut self, minutes: u32, report_progress: bool) -> u32 {
        let elapsed = self.engine.reset(minutes, report_progress);
        self.rearm();
        elapsed
    }

    pub fn add_minutes(&mut self, minutes: u32) -> Option<Event> {
        let event = self.engine.add_minutes(minutes);
        self.rearm();
        event
    }

    /// Poll until the countdown completes. Returns `None` right away when the
    /// engine is not running.
    pub async fn next_completion(&mut self) -> Option<Event> {
        loop {
            let ticker = self.ticker.as_mut()?;
            if !ticker.tick().await {
                self.ticker = None;
                return None;
            }
            if let Some(event) = self.engine.tick() {
                self.rearm();
                return Some(event);
            }
        }
    }

    /// Wait for one poll and report the result: `Some` on completion.
    pub async fn poll_once(&mut self) -> Option<Event> {
        let ticker = self.ticker.as_mut()?;
        if !ticker.tick().await {
            self.ticker = None;
            return None;
        }
        let event = self.engine.tick();
        if event.is_some() {
            self.rearm();
        }
        event
    }

    fn rearm(&mut self) {
        self.ticker = None;
        if self.engine.state() == TimerState::Running {
            self.ticker = Some(Ticker::spawn(self.poll_every));
        }
    }
}
