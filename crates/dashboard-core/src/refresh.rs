//! Periodic overview refresh as a cancellable stream.
//!
//! Each subscription owns one background task that takes a snapshot at a
//! fixed interval (first one immediately) and pushes it into the stream.
//! Failed snapshots are logged and skipped. Dropping the subscription, or
//! calling [`RefreshSubscription::cancel`], stops the task.
//!
//! A scheduler built with [`RefreshScheduler::following`] tracks the live
//! [`DashboardSettings`]: a new interval restarts the cycle with an
//! immediate snapshot, and turning auto refresh off pauses it.

use futures::Stream;
use medinet_infra_common::ManagedTask;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::{DashboardConfig, DashboardSettings, RefreshSettings};
use crate::snapshot::{OverviewSnapshot, SnapshotSource};

/// Snapshots buffered for a slow consumer before the task waits
const BUFFER: usize = 4;

#[derive(Clone)]
pub struct RefreshScheduler {
    source: Arc<dyn SnapshotSource>,
    settings: watch::Receiver<RefreshSettings>,
}

impl RefreshScheduler {
    /// Fixed settings taken from `config`
    pub fn new(source: Arc<dyn SnapshotSource>, config: &DashboardConfig) -> Self {
        let (_, settings) = watch::channel(config.refresh_settings());
        Self { source, settings }
    }

    /// Settings that follow every update made through `settings`
    pub fn following(source: Arc<dyn SnapshotSource>, settings: &DashboardSettings) -> Self {
        Self {
            source,
            settings: settings.watch_refresh(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.settings.borrow().interval
    }

    pub fn auto_refresh(&self) -> bool {
        self.settings.borrow().auto_refresh
    }

    pub fn subscribe(&self) -> RefreshSubscription {
        let (sender, receiver) = mpsc::channel(BUFFER);
        let source = self.source.clone();
        let mut settings = self.settings.clone();

        let task = ManagedTask::spawn("overview-refresh", move |cancel| async move {
            // false once the settings sender is gone and nothing can change
            let mut live = true;
            'settings: loop {
                let current = *settings.borrow_and_update();
                let mut ticker = current.auto_refresh.then(|| {
                    let mut ticker = tokio::time::interval(current.interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker
                });
                if ticker.is_none() {
                    debug!("Overview auto refresh is off");
                }

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break 'settings,
                        changed = settings.changed(), if live => {
                            if changed.is_err() {
                                live = false;
                                continue;
                            }
                            debug!("Overview refresh settings changed");
                            continue 'settings;
                        }
                        _ = next_tick(&mut ticker) => {}
                    }
                    let snapshot = tokio::select! {
                        _ = cancel.cancelled() => break 'settings,
                        result = source.snapshot() => result,
                    };
                    match snapshot {
                        Ok(snapshot) => {
                            if sender.send(snapshot).await.is_err() {
                                break 'settings;
                            }
                        }
                        Err(e) => warn!("Overview snapshot failed, skipping: {}", e),
                    }
                }
            }
            debug!("Overview refresh loop stopped");
        });

        RefreshSubscription { receiver, task }
    }
}

/// Next tick, or never while auto refresh is off
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Stream of overview snapshots; the producing task stops when this is dropped
pub struct RefreshSubscription {
    receiver: mpsc::Receiver<OverviewSnapshot>,
    task: ManagedTask,
}

impl RefreshSubscription {
    pub fn cancel(&mut self) {
        self.task.cancel();
        self.receiver.close();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_cancelled() && !self.task.is_finished()
    }
}

impl Stream for RefreshSubscription {
    type Item = OverviewSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
