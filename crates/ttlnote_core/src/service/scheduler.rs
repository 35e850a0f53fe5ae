//! Periodic sweep driver.
//!
//! # Responsibility
//! - Tick the shared engine's sweep on a fixed period.
//! - Stop cleanly on teardown.
//!
//! # Invariants
//! - Ticks never overlap: each one holds the engine lock for the whole sweep.
//! - No sweep runs after `SweepHandle::stop` returns.
//! - Missed ticks are skipped rather than replayed in a burst.

use crate::service::lifecycle::LifecycleEngine;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Engine shared between user-driven calls and the sweep task.
pub type SharedEngine = Arc<Mutex<LifecycleEngine>>;

pub fn share_engine(engine: LifecycleEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// Locks the engine, recovering the guard if a previous holder panicked.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, LifecycleEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running sweep task.
pub struct SweepHandle {
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    ticks: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Number of sweeps run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task and waits for it; an in-flight sweep completes first.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Release);
        self.wake.notify_one();
        if let Err(err) = self.task.await {
            warn!(
                "event=sweep_stop module=scheduler status=error error={}",
                err
            );
            return;
        }
        info!(
            "event=sweep_stop module=scheduler status=ok ticks={}",
            self.ticks.load(Ordering::Acquire)
        );
    }
}

/// Spawns the sweep loop on the current tokio runtime.
///
/// The first sweep runs one `period` after spawning.
pub fn start_sweeper(engine: SharedEngine, period: Duration) -> SweepHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let wake = Arc::new(Notify::new());
    let ticks = Arc::new(AtomicU64::new(0));

    let task = tokio::spawn({
        let stop = Arc::clone(&stop);
        let wake = Arc::clone(&wake);
        let ticks = Arc::clone(&ticks);
        async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = wake.notified() => break,
                    _ = ticker.tick() => {
                        if !run_tick(&engine, &stop) {
                            break;
                        }
                        ticks.fetch_add(1, Ordering::AcqRel);
                    }
                }
            }
        }
    });

    info!(
        "event=sweep_start module=scheduler status=ok period_ms={}",
        period.as_millis()
    );
    SweepHandle {
        stop,
        wake,
        ticks,
        task,
    }
}

// Returns false when stop was requested before the sweep could run.
fn run_tick(engine: &SharedEngine, stop: &AtomicBool) -> bool {
    let mut guard = lock_engine(engine);
    if stop.load(Ordering::Acquire) {
        return false;
    }
    let report = guard.sweep();
    if let Some(err) = &report.persist_error {
        warn!(
            "event=sweep_persist module=scheduler status=error expired={} error={}",
            report.expired.len(),
            err
        );
    }
    true
}
