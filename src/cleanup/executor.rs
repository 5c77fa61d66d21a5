//! Cleanup orchestration
//!
//! Drives filter -> select -> report/delete for one project or for every
//! accessible project. Failures are contained at the smallest unit that can
//! fail (branch, then project, then run) and turn into empty results plus a
//! log line; nothing here returns an error to the caller.

use super::filter::GroupFilter;
use super::selector::{AgeFilter, BranchInfo, HotfixPolicy, HotfixSelector};
use crate::host::{HostError, HostResult, Project, ProjectHost, ProjectId};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Settings fixed for the lifetime of an executor
#[derive(Debug, Clone, Default)]
pub struct CleanupSettings {
    /// Top-level groups to sweep; empty means all accessible projects
    pub group_filter: GroupFilter,
    /// Hotfix naming convention and retention window
    pub policy: HotfixPolicy,
    /// Restrict every run to this project and skip discovery
    pub project_override: Option<ProjectId>,
}

/// Statistics from a cleanup run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupStats {
    /// Projects scanned
    pub projects_scanned: usize,
    /// Hotfix branches found, regardless of age
    pub branches_found: usize,
    /// Hotfix branches past the retention window
    pub branches_expired: usize,
    /// Branches deleted (or that would be, in a dry run)
    pub branches_removed: usize,
    /// Errors encountered and contained
    pub errors: Vec<String>,
}

impl CleanupStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add another stats instance to this one
    pub fn merge(&mut self, other: &CleanupStats) {
        self.projects_scanned += other.projects_scanned;
        self.branches_found += other.branches_found;
        self.branches_expired += other.branches_expired;
        self.branches_removed += other.branches_removed;
        self.errors.extend(other.errors.iter().cloned());
    }
}

/// Outcome of one project or one run: the branch list plus its statistics
#[derive(Debug, Clone, Default)]
pub struct CleanupOutcome {
    pub branches: Vec<BranchInfo>,
    pub stats: CleanupStats,
}

impl CleanupOutcome {
    fn failed(reason: String) -> Self {
        Self {
            branches: Vec::new(),
            stats: CleanupStats {
                errors: vec![reason],
                ..CleanupStats::default()
            },
        }
    }

    fn append(&mut self, other: CleanupOutcome) {
        self.stats.merge(&other.stats);
        self.branches.extend(other.branches);
    }
}

/// Removes stale hotfix branches through a [`ProjectHost`]
pub struct CleanupExecutor {
    host: Arc<dyn ProjectHost>,
    selector: HotfixSelector,
    settings: CleanupSettings,
}

impl CleanupExecutor {
    pub fn new(host: Arc<dyn ProjectHost>, settings: CleanupSettings) -> Self {
        let selector = HotfixSelector::new(Arc::clone(&host), settings.policy.clone());
        Self {
            host,
            selector,
            settings,
        }
    }

    pub fn settings(&self) -> &CleanupSettings {
        &self.settings
    }

    /// Accessible projects narrowed by the group filter
    pub async fn filtered_projects(&self, dry_run: bool) -> HostResult<Vec<Project>> {
        let projects = self.host.list_accessible_projects().await?;
        Ok(self.settings.group_filter.apply(projects, dry_run))
    }

    /// Hotfix branches of one project; host errors yield an empty list
    pub async fn hotfix_branches(&self, id: &ProjectId, age: AgeFilter) -> Vec<BranchInfo> {
        self.selector.find(id, age).await
    }

    /// Clean a single project and return the affected branches
    ///
    /// In a dry run these are the branches that would be deleted; otherwise
    /// only the branches the host confirmed as deleted.
    pub async fn clean_project(&self, id: &ProjectId, dry_run: bool) -> Vec<BranchInfo> {
        self.clean_project_with_stats(id, dry_run).await.branches
    }

    /// Like [`clean_project`](Self::clean_project) but also returns statistics
    pub async fn clean_project_with_stats(&self, id: &ProjectId, dry_run: bool) -> CleanupOutcome {
        let project = match self.host.get_project(id).await {
            Ok(project) => project,
            Err(e) => return project_failure(id, e),
        };

        if dry_run {
            info!("Scanning project: {}", project.path);
        } else {
            debug!("Scanning project: {}", project.path);
        }

        let found = match self.selector.select_for(&project, AgeFilter::Disabled).await {
            Ok(found) => found,
            Err(e) => return project_failure(id, e),
        };
        let policy = self.selector.policy();
        let expired = policy.retain_expired(found.clone(), Utc::now());

        let mut stats = CleanupStats {
            projects_scanned: 1,
            branches_found: found.len(),
            branches_expired: expired.len(),
            ..CleanupStats::default()
        };

        let undated = found.iter().filter(|b| b.created_at.is_none()).count();
        if undated > 0 {
            warn!(
                "{} hotfix branches in {} have no commit timestamp and will be kept",
                undated, project.path
            );
        }

        if expired.is_empty() {
            if dry_run {
                if found.is_empty() {
                    info!("No hotfix branches found in {}", project.path);
                } else {
                    info!(
                        "Found {} hotfix branches in {}, but none are older than {} days",
                        found.len(),
                        project.path,
                        policy.retention().num_days()
                    );
                }
            }
            return CleanupOutcome {
                branches: Vec::new(),
                stats,
            };
        }

        if dry_run {
            info!(
                "Found {} hotfix branches older than {} days in {}",
                expired.len(),
                policy.retention().num_days(),
                project.path
            );
            stats.branches_removed = expired.len();
            return CleanupOutcome {
                branches: expired,
                stats,
            };
        }

        let mut deleted = Vec::with_capacity(expired.len());
        for branch in expired {
            match self.host.delete_branch(&project.id, &branch.name).await {
                Ok(()) => {
                    info!(
                        "Successfully deleted branch: {} from {} (created at: {})",
                        branch.name,
                        branch.project,
                        branch
                            .created_at
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "unknown".to_string())
                    );
                    deleted.push(branch);
                }
                Err(e) => {
                    error!(
                        "Failed to delete branch {} from {}: {}",
                        branch.name, branch.project, e
                    );
                    stats
                        .errors
                        .push(format!("{}: {}: {}", branch.project, branch.name, e));
                }
            }
        }

        stats.branches_removed = deleted.len();
        CleanupOutcome {
            branches: deleted,
            stats,
        }
    }

    /// Run cleanup across the configured scope and concatenate the results
    pub async fn run_cleanup(&self, dry_run: bool) -> Vec<BranchInfo> {
        self.run_cleanup_with_stats(dry_run).await.branches
    }

    /// Like [`run_cleanup`](Self::run_cleanup) but also returns aggregated statistics
    pub async fn run_cleanup_with_stats(&self, dry_run: bool) -> CleanupOutcome {
        if let Some(id) = &self.settings.project_override {
            info!("Cleanup restricted to project {}", id);
            return self.clean_project_with_stats(id, dry_run).await;
        }

        info!("Starting hotfix branch cleanup across all projects...");
        if !self.settings.group_filter.is_empty() {
            info!(
                "Filtering projects for groups: {}",
                self.settings.group_filter
            );
        }

        let projects = match self.filtered_projects(dry_run).await {
            Ok(projects) => projects,
            Err(e) => {
                error!("Error fetching projects: {}", e);
                return CleanupOutcome::failed(format!("project listing: {e}"));
            }
        };
        info!("Found {} projects to scan", projects.len());

        let mut outcome = CleanupOutcome::default();
        for project in &projects {
            let project_outcome = self.clean_project_with_stats(&project.id, dry_run).await;
            outcome.append(project_outcome);
        }

        let stats = &outcome.stats;
        info!(
            scanned = stats.projects_scanned,
            found = stats.branches_found,
            expired = stats.branches_expired,
            removed = stats.branches_removed,
            errors = stats.errors.len(),
            dry_run,
            "Hotfix branch cleanup completed"
        );
        outcome
    }
}

fn project_failure(id: &ProjectId, e: HostError) -> CleanupOutcome {
    if e.is_not_found() {
        warn!("Project {} not found or not accessible: {}", id, e);
    } else {
        error!("Error processing project {}: {}", id, e);
    }
    CleanupOutcome::failed(format!("project {id}: {e}"))
}
