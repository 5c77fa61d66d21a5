//! Scheduler trigger tests with paused tokio time

mod common;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local};
use common::{days_ago, executor_for, reference_host};
use hotfix_sweeper::cleanup::CleanupExecutor;
use hotfix_sweeper::host::{
    Branch, HostCall, HostResult, MockProjectHost, Project, ProjectHost, ProjectId,
};
use hotfix_sweeper::scheduler::{self, Schedule};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fires at a fixed interval instead of once a day
struct EveryHour;

impl Schedule for EveryHour {
    fn next_after(&self, now: DateTime<Local>) -> DateTime<Local> {
        now + ChronoDuration::hours(1)
    }
}

/// Mock host whose deletions take a while
struct SlowDeletes {
    inner: MockProjectHost,
    delay: Duration,
}

#[async_trait]
impl ProjectHost for SlowDeletes {
    async fn list_accessible_projects(&self) -> HostResult<Vec<Project>> {
        self.inner.list_accessible_projects().await
    }

    async fn get_project(&self, id: &ProjectId) -> HostResult<Project> {
        self.inner.get_project(id).await
    }

    async fn list_branches(&self, project: &ProjectId) -> HostResult<Vec<Branch>> {
        self.inner.list_branches(project).await
    }

    async fn delete_branch(&self, project: &ProjectId, branch: &str) -> HostResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete_branch(project, branch).await
    }
}

fn project_listings(calls: &[HostCall]) -> usize {
    calls
        .iter()
        .filter(|call| **call == HostCall::ListProjects)
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_fires_each_tick_until_cancelled() {
    let host = Arc::new(reference_host());
    let executor = Arc::new(executor_for(host.clone(), &["g1"]));
    let shutdown = CancellationToken::new();

    let handle = scheduler::spawn_scheduler(executor, EveryHour, shutdown.clone());

    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    assert_eq!(project_listings(&host.calls().await), 0);

    tokio::time::sleep(Duration::from_secs(3 * 60 * 60)).await;
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(project_listings(&host.calls().await), 3);
    // Only the first run finds an expired branch to delete
    assert_eq!(host.delete_calls().await, vec!["hotfix/login"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_first_tick_runs_nothing() {
    let host = Arc::new(reference_host());
    let executor = Arc::new(executor_for(host.clone(), &[]));
    let shutdown = CancellationToken::new();

    let handle = scheduler::spawn_scheduler(executor, EveryHour, shutdown.clone());
    shutdown.cancel();
    handle.await.unwrap();

    assert!(host.calls().await.is_empty());
}

#[tokio::test]
async fn test_immediate_run_is_live() {
    let host = Arc::new(reference_host());
    let executor = Arc::new(executor_for(host.clone(), &["g1"]));

    let deleted = scheduler::spawn_immediate_run(executor).await.unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(host.delete_calls().await, vec!["hotfix/login"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_completes_startup_run_in_progress() {
    let branches = (0..5)
        .map(|i| Branch::new(format!("hotfix/fix-{i}"), days_ago(10)))
        .collect();
    let host = Arc::new(SlowDeletes {
        inner: MockProjectHost::new().with_project(Project::new(1, "g1/repoA"), branches),
        delay: Duration::from_millis(100),
    });
    let executor = Arc::new(CleanupExecutor::new(host.clone(), Default::default()));

    // Shutdown arrives while the third deletion is still pending
    scheduler::serve(
        executor,
        EveryHour,
        true,
        tokio::time::sleep(Duration::from_millis(250)),
    )
    .await;

    assert_eq!(host.inner.delete_calls().await.len(), 5);
    assert!(host.inner.remaining_branches("g1/repoA").await.is_empty());
    // The recurring trigger was stopped before its first tick
    assert_eq!(project_listings(&host.inner.calls().await), 1);
}

#[tokio::test(start_paused = true)]
async fn test_serve_without_startup_run_only_stops_scheduler() {
    let host = Arc::new(reference_host());
    let executor = Arc::new(executor_for(host.clone(), &["g1"]));

    scheduler::serve(
        executor,
        EveryHour,
        false,
        tokio::time::sleep(Duration::from_secs(60)),
    )
    .await;

    assert!(host.calls().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_long_run_pushes_back_the_next_tick() {
    let host = Arc::new(SlowDeletes {
        inner: MockProjectHost::new().with_project(
            Project::new(1, "g1/repoA"),
            vec![Branch::new("hotfix/slow", days_ago(10))],
        ),
        delay: Duration::from_secs(90 * 60),
    });
    let executor = Arc::new(CleanupExecutor::new(host.clone(), Default::default()));
    let shutdown = CancellationToken::new();

    let handle = scheduler::spawn_scheduler(executor, EveryHour, shutdown.clone());

    // First tick at 1h runs until 2h30, so the next one is due at 3h30
    tokio::time::sleep(Duration::from_secs(3 * 60 * 60)).await;
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(project_listings(&host.inner.calls().await), 1);
    assert_eq!(host.inner.delete_calls().await, vec!["hotfix/slow"]);
}
