//! Common test utilities and fixtures

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use hotfix_sweeper::cleanup::{CleanupExecutor, CleanupSettings, GroupFilter};
use hotfix_sweeper::host::{Branch, MockProjectHost, Project};
use std::sync::Arc;

/// Timestamp `days` days before now
pub fn days_ago(days: i64) -> Option<DateTime<Utc>> {
    Some(Utc::now() - Duration::days(days))
}

/// The reference scenario: one g1 project with an old and a fresh hotfix
/// branch plus a feature branch, and an unrelated project in g2
pub fn reference_host() -> MockProjectHost {
    MockProjectHost::new()
        .with_project(
            Project::new(1, "g1/repoA").with_default_branch("main"),
            vec![
                Branch::new("hotfix/login", days_ago(5)),
                Branch::new("hotfix/payment", days_ago(1)),
                Branch::new("feature/x", days_ago(20)),
            ],
        )
        .with_project(
            Project::new(2, "g2/repoB"),
            vec![Branch::new("hotfix/legacy", days_ago(40))],
        )
}

/// Executor restricted to the given groups
pub fn executor_for(host: Arc<MockProjectHost>, groups: &[&str]) -> CleanupExecutor {
    let settings = CleanupSettings {
        group_filter: GroupFilter::new(groups),
        ..CleanupSettings::default()
    };
    CleanupExecutor::new(host, settings)
}
