//! Periodic crawl runs with at-most-one run in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::models::{RunOutcome, ScheduleConfig};
use crate::pipeline::crawl::CrawlOrchestrator;

/// Tracks whether a run is executing and whether the schedule should stop.
pub struct RunLifecycle {
    running: AtomicBool,
    shutdown: watch::Sender<bool>,
}

/// Held for the duration of one run; releases the slot on drop.
pub struct RunPermit<'a> {
    lifecycle: &'a RunLifecycle,
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.lifecycle.running.store(false, Ordering::Release);
    }
}

impl RunLifecycle {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            running: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Claim the run slot, or `None` if a run is already executing.
    pub fn try_start(&self) -> Option<RunPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit { lifecycle: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the schedule to stop. A run in progress is allowed to finish.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`stop`](Self::stop) has been called.
    pub async fn stopped(&self) {
        let mut rx = self.shutdown.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for RunLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the crawl once if no other run holds the slot.
pub async fn run_guarded(
    orchestrator: &CrawlOrchestrator,
    lifecycle: &RunLifecycle,
) -> Option<RunOutcome> {
    let Some(_permit) = lifecycle.try_start() else {
        log::warn!("Previous crawl still running, skipping this tick");
        return None;
    };
    Some(orchestrator.run().await)
}

/// Run the crawl every `schedule.interval_secs` until the lifecycle is stopped.
///
/// Ticks that fall due while a run is executing are dropped rather than
/// queued. Returns the number of runs performed.
pub async fn run_periodic(
    orchestrator: &CrawlOrchestrator,
    lifecycle: &RunLifecycle,
    schedule: &ScheduleConfig,
) -> usize {
    let period = Duration::from_secs(schedule.interval_secs);
    let first = if schedule.run_on_start {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log::info!("Crawling every {}s", schedule.interval_secs);

    let mut runs = 0;
    loop {
        tokio::select! {
            biased;
            _ = lifecycle.stopped() => break,
            _ = ticker.tick() => {}
        }

        if let Some(outcome) = run_guarded(orchestrator, lifecycle).await {
            runs += 1;
            if let Some(reason) = outcome.failure() {
                log::warn!("Run {runs} failed, retrying from the start next tick: {reason}");
            }
        }
    }

    log::info!("Schedule stopped after {runs} runs");
    runs
}
