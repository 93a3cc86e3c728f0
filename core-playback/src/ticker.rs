//! Periodic progress sampling.
//!
//! The ticker never reads the player itself. It only posts a message into
//! the controller queue every period; the worker samples the position when it
//! handles that message. Sampling is therefore ordered with every other
//! command, including teardown.

use std::time::Duration;
use tokio::sync::mpsc::WeakSender;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Handle to a running ticker task. Dropping it stops the task.
#[derive(Debug)]
pub struct ProgressTicker {
    token: CancellationToken,
}

impl ProgressTicker {
    /// Spawn a ticker that posts `message()` into `queue` every `period`.
    ///
    /// The first message is posted one full period after the start. The task
    /// exits on [`stop`](Self::stop), on drop, or once the queue is closed.
    pub fn start<M, F>(period: Duration, queue: WeakSender<M>, message: F) -> Self
    where
        M: Send + 'static,
        F: Fn() -> M + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(sender) = queue.upgrade() else {
                            break;
                        };
                        if sender.send(message()).await.is_err() {
                            break;
                        }
                    }
                }
            }
            trace!("Progress ticker stopped");
        });

        Self { token }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
