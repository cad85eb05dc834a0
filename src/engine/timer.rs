//! Cancellable deferred tasks for the schedulers

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use super::game::Command;

/// A scheduler timer owned by the game loop
///
/// Dropping the task aborts it, so replacing a slot (rate change) or clearing
/// it (pause, game over, teardown) cancels the pending timer exactly once.
/// Commands are epoch-stamped by the caller; a tick already queued when its
/// timer is cancelled is discarded by the loop's epoch check.
pub(crate) struct TimerTask {
    handle: JoinHandle<()>,
}

impl TimerTask {
    /// Send `cmd` after `first`, then every `period`
    pub(crate) fn repeating(
        first: Duration,
        period: Duration,
        tx: mpsc::Sender<Command>,
        cmd: Command,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + first, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                if tx.send(cmd.clone()).await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Send `cmd` once after `delay`
    pub(crate) fn once(delay: Duration, tx: mpsc::Sender<Command>, cmd: Command) -> Self {
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(cmd).await;
        });
        Self { handle }
    }
}

impl Drop for TimerTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
