//! Cancellable repeating poll task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Sends a unit message every `every` until dropped.
///
/// Must be created inside a tokio runtime. Dropping the ticker aborts its task.
pub struct Ticker {
    handle: JoinHandle<()>,
    rx: mpsc::Receiver<()>,
}

impl Ticker {
    pub fn spawn(every: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Self { handle, rx }
    }

    /// Wait for the next poll. Returns false once the task is gone.
    pub async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_repeatedly() {
        let mut ticker = Ticker::spawn(Duration::from_millis(100));
        for _ in 0..3 {
            assert!(ticker.tick().await);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_task() {
        let ticker = Ticker::spawn(Duration::from_millis(100));
        let handle = ticker.handle.abort_handle();
        drop(ticker);
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_finished());
    }
}
