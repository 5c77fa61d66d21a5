//! Recurring and startup triggers for cleanup runs
//!
//! The daily trigger is a task owned by the process lifecycle and stopped
//! through a [`CancellationToken`]. Each triggered run executes as its own
//! task, so a panicking run is reported as a failed join instead of taking
//! the scheduler down. Runs are not guarded against overlapping: the startup
//! run and a daily tick may execute at the same time. The next fire time is
//! computed only after a run finishes, so a run lasting past the next fire
//! time skips that tick.

use crate::cleanup::CleanupExecutor;
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// When the next run should fire
pub trait Schedule: Send + Sync {
    /// First fire time strictly after `now`
    fn next_after(&self, now: DateTime<Local>) -> DateTime<Local>;
}

/// Fires once per calendar day at a fixed local wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAt {
    at: NaiveTime,
}

impl DailyAt {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn midnight() -> Self {
        Self::new(NaiveTime::MIN)
    }
}

impl Schedule for DailyAt {
    fn next_after(&self, now: DateTime<Local>) -> DateTime<Local> {
        next_occurrence(self.at, &now)
    }
}

/// Next instant after `now` whose wall-clock time in `now`'s zone is `at`
///
/// Days where `at` falls into a DST gap are skipped.
pub fn next_occurrence<Tz: TimeZone>(at: NaiveTime, now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();

    for _ in 0..7 {
        if let Some(fire) = date.and_time(at).and_local_timezone(tz.clone()).earliest() {
            if fire > *now {
                return fire;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    now.clone() + Duration::days(1)
}

/// Run a live cleanup in its own task and wait for it
///
/// Returns the number of deleted branches; a panicked run counts as zero.
pub async fn run_live(executor: Arc<CleanupExecutor>) -> usize {
    let handle = tokio::spawn(async move { executor.run_cleanup(false).await });
    match handle.await {
        Ok(deleted) => deleted.len(),
        Err(e) => {
            error!("Cleanup run aborted: {}", e);
            0
        }
    }
}

/// Start the recurring trigger
///
/// Waits for each fire time, runs a live cleanup, and repeats until
/// `shutdown` is cancelled. A run already in progress is completed first.
pub fn spawn_scheduler<S>(
    executor: Arc<CleanupExecutor>,
    schedule: S,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    S: Schedule + 'static,
{
    tokio::spawn(async move {
        loop {
            let now = Local::now();
            let next = schedule.next_after(now);
            let delay = (next - now).to_std().unwrap_or_default();
            info!("Next hotfix branch cleanup scheduled for {}", next);

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            info!("Running scheduled hotfix branch cleanup...");
            let deleted = run_live(Arc::clone(&executor)).await;
            info!("Scheduled cleanup finished, {} branches deleted", deleted);
        }
        info!("Scheduler stopped");
    })
}

/// Start a single live run right away, independent of the schedule
pub fn spawn_immediate_run(executor: Arc<CleanupExecutor>) -> JoinHandle<usize> {
    info!("Running test cleanup...");
    tokio::spawn(run_live(executor))
}

/// Run the recurring trigger, plus an optional startup run, until
/// `shutdown_signal` resolves
///
/// Runs in progress when the signal arrives are awaited before returning.
pub async fn serve<S, F>(
    executor: Arc<CleanupExecutor>,
    schedule: S,
    run_immediately: bool,
    shutdown_signal: F,
) where
    S: Schedule + 'static,
    F: Future<Output = ()>,
{
    let shutdown = CancellationToken::new();
    let recurring = spawn_scheduler(Arc::clone(&executor), schedule, shutdown.clone());
    let startup = run_immediately.then(|| spawn_immediate_run(Arc::clone(&executor)));

    shutdown_signal.await;
    info!("Shutting down...");
    shutdown.cancel();

    if let Some(startup) = startup {
        match startup.await {
            Ok(deleted) => info!("Startup cleanup finished, {} branches deleted", deleted),
            Err(e) => error!("Startup cleanup task failed: {}", e),
        }
    }
    if let Err(e) = recurring.await {
        error!("Scheduler task failed: {}", e);
    }
}
