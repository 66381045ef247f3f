//! Periodic re-evaluation of a sealed capsule.
//!
//! A [`CountdownTicker`] runs the disclosure gate on a fixed period and
//! publishes each result on a `watch` channel, stopping after the first
//! [`Disclosure::Unsealed`]. The returned [`CountdownHandle`] owns the task;
//! dropping it stops the ticking.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use time_capsule_core::{Clock, Disclosure, disclosure};

/// Shortest re-evaluation period; shorter requests are raised to it.
pub const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Spawns countdown tasks.
#[derive(Debug, Clone, Copy)]
pub struct CountdownTicker;

impl CountdownTicker {
    /// Evaluate `open_time` now, then every `period` until it unseals.
    /// A `period` below [`MIN_PERIOD`] is clamped to it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(
        open_time: DateTime<Utc>,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> CountdownHandle {
        let period = period.max(MIN_PERIOD);
        let initial = disclosure::evaluate_at(open_time, clock.now());
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            if !initial.is_sealed() {
                return;
            }

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately and was covered above.
            interval.tick().await;

            loop {
                interval.tick().await;
                let state = disclosure::evaluate_at(open_time, clock.now());
                let unsealed = !state.is_sealed();
                if tx.send(state).is_err() || unsealed {
                    break;
                }
            }
            debug!(%open_time, "Countdown finished");
        });

        CountdownHandle { rx, task }
    }
}

/// Owner of a running countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    rx: watch::Receiver<Disclosure>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// The most recently published state.
    #[must_use]
    pub fn current(&self) -> Disclosure {
        *self.rx.borrow()
    }

    /// Wait for the next published state.
    ///
    /// Returns `None` once the ticker has stopped and every state has been
    /// seen.
    pub async fn next(&mut self) -> Option<Disclosure> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Wait until the capsule is observed unsealed.
    ///
    /// Returns `false` if the ticker was cancelled first.
    pub async fn wait_unsealed(&mut self) -> bool {
        self.rx.wait_for(|state| !state.is_sealed()).await.is_ok()
    }

    /// A receiver for observers that outlive a borrow of the handle.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Disclosure> {
        self.rx.clone()
    }

    /// Stop ticking. Nothing is published afterwards.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the ticker task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
