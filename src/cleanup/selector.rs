//! Hotfix branch selection
//!
//! A branch is a hotfix branch when its name starts with the configured
//! prefix, compared case-insensitively. When the age filter is on, a hotfix
//! branch is only selected once its latest commit is older than the
//! retention window; branches without a timestamp never pass the age filter.

use crate::host::{Branch, HostResult, Project, ProjectHost, ProjectId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// Path-style prefix used unless configured otherwise
pub const DEFAULT_HOTFIX_PREFIX: &str = "hotfix/";

/// Hotfix branches younger than this are always kept
pub const RETENTION_WINDOW_DAYS: i64 = 3;

/// A selected or deleted branch, as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub name: String,
    /// Path of the owning project
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl BranchInfo {
    fn from_branch(branch: Branch, project: &Project) -> Self {
        Self {
            name: branch.name,
            project: project.path.clone(),
            created_at: branch.created_at,
        }
    }
}

/// Whether selection also applies the retention window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFilter {
    Enabled,
    Disabled,
}

/// Naming convention and retention window for hotfix branches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotfixPolicy {
    prefix: String,
    retention: Duration,
}

impl Default for HotfixPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_HOTFIX_PREFIX)
    }
}

impl HotfixPolicy {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_lowercase(),
            retention: Duration::days(RETENTION_WINDOW_DAYS),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Case-insensitive prefix match on the branch name
    pub fn is_hotfix(&self, name: &str) -> bool {
        name.to_lowercase().starts_with(&self.prefix)
    }

    /// True iff `created_at` is present and strictly before `now - retention`
    pub fn is_expired(&self, created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match created_at {
            Some(created) => created < now - self.retention,
            None => false,
        }
    }

    /// Pure selection over a branch listing, preserving its order
    pub fn select(
        &self,
        project: &Project,
        branches: Vec<Branch>,
        age: AgeFilter,
        now: DateTime<Utc>,
    ) -> Vec<BranchInfo> {
        let hotfixes: Vec<BranchInfo> = branches
            .into_iter()
            .filter(|b| self.is_hotfix(&b.name))
            .map(|b| BranchInfo::from_branch(b, project))
            .collect();

        match age {
            AgeFilter::Enabled => self.retain_expired(hotfixes, now),
            AgeFilter::Disabled => hotfixes,
        }
    }

    /// Keep only branches past the retention window
    pub fn retain_expired(&self, branches: Vec<BranchInfo>, now: DateTime<Utc>) -> Vec<BranchInfo> {
        branches
            .into_iter()
            .filter(|b| self.is_expired(b.created_at, now))
            .collect()
    }
}

/// Finds hotfix branches of a project through the host
pub struct HotfixSelector {
    host: Arc<dyn ProjectHost>,
    policy: HotfixPolicy,
}

impl HotfixSelector {
    pub fn new(host: Arc<dyn ProjectHost>, policy: HotfixPolicy) -> Self {
        Self { host, policy }
    }

    pub fn policy(&self) -> &HotfixPolicy {
        &self.policy
    }

    /// Resolve `id` and select its hotfix branches
    ///
    /// Host failures are logged and yield an empty list.
    pub async fn find(&self, id: &ProjectId, age: AgeFilter) -> Vec<BranchInfo> {
        let project = match self.host.get_project(id).await {
            Ok(project) => project,
            Err(e) => {
                error!("Error getting branches for project {}: {}", id, e);
                return Vec::new();
            }
        };

        match self.select_for(&project, age).await {
            Ok(branches) => branches,
            Err(e) => {
                error!("Error getting branches for project {}: {}", id, e);
                Vec::new()
            }
        }
    }

    /// Select hotfix branches of an already resolved project
    pub async fn select_for(&self, project: &Project, age: AgeFilter) -> HostResult<Vec<BranchInfo>> {
        let branches = self.host.list_branches(&project.id).await?;
        Ok(self.policy.select(project, branches, age, Utc::now()))
    }
}
