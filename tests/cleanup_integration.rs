//! End-to-end cleanup behavior against the in-memory host

mod common;

use common::{days_ago, executor_for, reference_host};
use hotfix_sweeper::cleanup::{AgeFilter, CleanupExecutor, CleanupSettings};
use hotfix_sweeper::host::{Branch, HostCall, MockProjectHost, Project, ProjectId};
use std::sync::Arc;

#[tokio::test]
async fn test_reference_scenario_deletes_only_old_hotfix() {
    let host = Arc::new(reference_host());
    let executor = executor_for(host.clone(), &["g1"]);

    let deleted = executor.run_cleanup(false).await;

    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].name, "hotfix/login");
    assert_eq!(deleted[0].project, "g1/repoA");
    assert_eq!(host.delete_calls().await, vec!["hotfix/login"]);
    assert_eq!(
        host.remaining_branches("g1/repoA").await,
        vec!["hotfix/payment", "feature/x"]
    );
    assert_eq!(host.remaining_branches("g2/repoB").await, vec!["hotfix/legacy"]);
}

#[tokio::test]
async fn test_dry_run_issues_no_mutations() {
    let host = Arc::new(reference_host());
    let executor = executor_for(host.clone(), &[]);

    let candidates = executor.run_cleanup(true).await;

    let names: Vec<_> = candidates.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["hotfix/login", "hotfix/legacy"]);
    assert!(!host
        .calls()
        .await
        .iter()
        .any(|call| matches!(call, HostCall::DeleteBranch { .. })));
}

#[tokio::test]
async fn test_results_follow_project_iteration_order() {
    let host = Arc::new(
        MockProjectHost::new()
            .with_project(
                Project::new(10, "team/zeta"),
                vec![Branch::new("hotfix/z", days_ago(9))],
            )
            .with_project(
                Project::new(11, "TEAM/alpha"),
                vec![
                    Branch::new("hotfix/a2", days_ago(9)),
                    Branch::new("hotfix/a1", days_ago(9)),
                ],
            )
            .with_project(
                Project::new(12, "other/repo"),
                vec![Branch::new("hotfix/o", days_ago(9))],
            ),
    );
    let executor = executor_for(host.clone(), &["team"]);

    let deleted = executor.run_cleanup(false).await;

    let pairs: Vec<_> = deleted
        .iter()
        .map(|b| (b.project.as_str(), b.name.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("team/zeta", "hotfix/z"),
            ("TEAM/alpha", "hotfix/a2"),
            ("TEAM/alpha", "hotfix/a1"),
        ]
    );
}

#[tokio::test]
async fn test_failing_project_does_not_abort_siblings() {
    let host = Arc::new(
        reference_host()
            .with_project(
                Project::new(3, "g1/broken"),
                vec![Branch::new("hotfix/x", days_ago(9))],
            )
            .fail_branch_listing("g1/broken")
            .with_project(
                Project::new(4, "g1/repoC"),
                vec![Branch::new("hotfix/old", days_ago(9))],
            ),
    );
    let executor = executor_for(host.clone(), &["g1"]);

    let outcome = executor.run_cleanup_with_stats(false).await;

    let names: Vec<_> = outcome.branches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["hotfix/login", "hotfix/old"]);
    assert_eq!(outcome.stats.errors.len(), 1);
    assert_eq!(outcome.stats.projects_scanned, 2);
}

#[tokio::test]
async fn test_delete_failure_is_excluded_from_results() {
    let host = Arc::new(
        MockProjectHost::new()
            .with_project(
                Project::new(1, "g1/repo"),
                vec![
                    Branch::new("hotfix/one", days_ago(4)),
                    Branch::new("hotfix/two", days_ago(4)),
                ],
            )
            .fail_delete("g1/repo", "hotfix/one"),
    );
    let executor = executor_for(host.clone(), &["g1"]);

    let deleted = executor.run_cleanup(false).await;

    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].name, "hotfix/two");
    assert_eq!(host.delete_calls().await, vec!["hotfix/one", "hotfix/two"]);
}

#[tokio::test]
async fn test_override_never_lists_projects() {
    let host = Arc::new(reference_host());
    let settings = CleanupSettings {
        project_override: Some(ProjectId::Numeric(2)),
        ..CleanupSettings::default()
    };
    let executor = CleanupExecutor::new(host.clone(), settings);

    let deleted = executor.run_cleanup(false).await;

    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].project, "g2/repoB");
    let calls = host.calls().await;
    assert!(!calls.contains(&HostCall::ListProjects));
    assert_eq!(calls[0], HostCall::GetProject(ProjectId::Numeric(2)));
}

#[tokio::test]
async fn test_undated_branches_reported_but_never_deleted() {
    let host = Arc::new(MockProjectHost::new().with_project(
        Project::new(1, "g1/repo"),
        vec![Branch::new("hotfix/undated", None)],
    ));
    let executor = executor_for(host.clone(), &["g1"]);

    let found = executor
        .hotfix_branches(&ProjectId::Numeric(1), AgeFilter::Disabled)
        .await;
    assert_eq!(found.len(), 1);
    assert!(found[0].created_at.is_none());

    assert!(executor
        .hotfix_branches(&ProjectId::Numeric(1), AgeFilter::Enabled)
        .await
        .is_empty());
    assert!(executor.run_cleanup(false).await.is_empty());
    assert!(host.delete_calls().await.is_empty());
}

#[tokio::test]
async fn test_project_list_failure_yields_empty_run() {
    let host = Arc::new(reference_host().fail_project_listing());
    let executor = executor_for(host.clone(), &["g1"]);

    assert!(executor.run_cleanup(false).await.is_empty());
    assert!(host.delete_calls().await.is_empty());
}
