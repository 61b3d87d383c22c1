//! Repeating timer that posts commands into a room

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::room::RoomSender;

/// Handle of a repeating timer task
///
/// Every period the task builds a command and queues it into the room it was
/// started for. The period can be changed while running; the change applies to the
/// next wait immediately. A stopped ticker never sends again: the task checks the
/// liveness flag right before every send, and is also aborted.
#[derive(Debug)]
pub struct Ticker {
    alive: Arc<AtomicBool>,
    period: watch::Sender<Duration>,
    task: tokio::task::JoinHandle<()>,
}

impl Ticker {
    /// Start a ticker, must be called from within a tokio runtime
    pub fn spawn<C, F>(sender: RoomSender<C>, period: Duration, mut make_command: F) -> Self
    where
        C: Send + 'static,
        F: FnMut() -> C + Send + 'static,
    {
        let alive = Arc::new(AtomicBool::new(true));
        let (period_tx, mut period_rx) = watch::channel(period);
        let task_alive = alive.clone();

        let task = tokio::spawn(async move {
            let mut current = *period_rx.borrow_and_update();
            loop {
                tokio::select! {
                    () = tokio::time::sleep(current) => {
                        if !task_alive.load(Ordering::Acquire) {
                            break;
                        }
                        if sender.send(make_command()).is_err() {
                            // Room is gone
                            break;
                        }
                    }
                    changed = period_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        current = *period_rx.borrow_and_update();
                    }
                }
            }
            tracing::trace!("Ticker stopped");
        });

        Self {
            alive,
            period: period_tx,
            task,
        }
    }

    /// Change the period between two commands
    pub fn set_period(&self, period: Duration) {
        self.period.send_if_modified(|current| {
            if *current == period {
                false
            } else {
                *current = period;
                true
            }
        });
    }

    /// Current period
    pub fn period(&self) -> Duration {
        *self.period.borrow()
    }

    /// Stop the ticker, idempotent
    pub fn stop(&self) {
        self.alive.store(false, Ordering::Release);
        self.task.abort();
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
