//! Background sync loop.
//!
//! Runs one cycle per tick until the tick source runs dry or the handle is
//! shut down. Ticks come from a `TickSource` so callers can swap the wall
//! clock for manual triggers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::engine::SyncEngine;
use crate::store::OpContext;

#[async_trait]
pub trait TickSource: Send {
    /// Wait for the next tick. `false` means no more ticks will come.
    async fn next_tick(&mut self) -> bool;
}

/// Wall-clock ticks. The first one fires one full period after creation.
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks fired by hand through a paired `ManualTrigger`.
pub struct ManualTicks {
    rx: mpsc::UnboundedReceiver<()>,
}

#[derive(Clone)]
pub struct ManualTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualTrigger {
    /// Queue one tick. Returns `false` once the loop is gone.
    pub fn fire(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

#[async_trait]
impl TickSource for ManualTicks {
    async fn next_tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// A trigger and the tick source it feeds. Dropping every trigger ends
/// the source after the queued ticks are consumed.
pub fn manual() -> (ManualTrigger, ManualTicks) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ManualTrigger { tx }, ManualTicks { rx })
}

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub cycles: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub pushed: u64,
    pub pulled: u64,
}

/// Control handle for a running sync loop.
#[derive(Clone)]
pub struct SyncLoopHandle {
    shutdown: CancellationToken,
}

impl SyncLoopHandle {
    /// Stop the loop. An in-flight cycle is cancelled.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Spawn the sync loop as a tokio task.
pub fn spawn_sync_loop<T>(
    engine: Arc<SyncEngine>,
    mut ticks: T,
) -> (JoinHandle<SyncStats>, SyncLoopHandle)
where
    T: TickSource + 'static,
{
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();

    let handle = tokio::spawn(async move {
        info!(owner = engine.owner_id(), "sync loop started");
        let mut stats = SyncStats::default();

        loop {
            let ticked = tokio::select! {
                biased;
                _ = token.cancelled() => false,
                ticked = ticks.next_tick() => ticked,
            };
            if !ticked || token.is_cancelled() {
                break;
            }

            stats.cycles += 1;
            let ctx = OpContext::from_token(token.child_token());
            match engine.run_cycle(&ctx).await {
                Ok(report) => {
                    stats.succeeded += 1;
                    stats.pushed += report.pushed.len() as u64;
                    stats.pulled += report.pulled.len() as u64;
                }
                Err(e) if e.is_skip() => {
                    stats.skipped += 1;
                    debug!(error = %e, "sync cycle skipped");
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(error = %e, "sync cycle failed");
                }
            }
        }

        info!(
            cycles = stats.cycles,
            failed = stats.failed,
            "sync loop stopped"
        );
        stats
    });

    (handle, SyncLoopHandle { shutdown })
}
