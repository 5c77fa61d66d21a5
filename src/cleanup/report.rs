//! Operator preview of a cleanup
//!
//! Lists the filtered projects, every hotfix branch they carry, and the
//! branches a cleanup would delete. Nothing is deleted.

use super::executor::CleanupExecutor;
use super::selector::{AgeFilter, BranchInfo};
use crate::error::{Error, Result};
use crate::host::Project;
use std::fmt;

/// One scanned project in a preview
#[derive(Debug, Clone)]
pub struct ProjectPreview {
    pub project: Project,
    pub hotfix_branches: Vec<String>,
}

/// Result of [`build_preview`]
#[derive(Debug, Clone)]
pub struct PreviewReport {
    pub groups: String,
    pub projects: Vec<ProjectPreview>,
    /// Branches a live run would delete, grouped by project in first-seen order
    pub would_delete: Vec<(String, Vec<String>)>,
}

impl PreviewReport {
    pub fn total_hotfix_branches(&self) -> usize {
        self.projects.iter().map(|p| p.hotfix_branches.len()).sum()
    }
}

/// Build a preview for the executor's configured groups
///
/// Requires a non-empty group filter so a preview never walks every
/// accessible project by accident.
pub async fn build_preview(executor: &CleanupExecutor) -> Result<PreviewReport> {
    let settings = executor.settings();
    if settings.group_filter.is_empty() {
        return Err(Error::Config(
            "GROUP_FILTER is required for a preview".to_string(),
        ));
    }

    let projects = executor.filtered_projects(true).await?;

    let mut previews = Vec::with_capacity(projects.len());
    for project in projects {
        let hotfix_branches = executor
            .hotfix_branches(&project.id, AgeFilter::Disabled)
            .await
            .into_iter()
            .map(|b| b.name)
            .collect();
        previews.push(ProjectPreview {
            project,
            hotfix_branches,
        });
    }

    let candidates = executor.run_cleanup(true).await;

    Ok(PreviewReport {
        groups: settings.group_filter.to_string(),
        projects: previews,
        would_delete: group_by_project(candidates),
    })
}

fn group_by_project(branches: Vec<BranchInfo>) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for branch in branches {
        match grouped.iter_mut().find(|(project, _)| *project == branch.project) {
            Some((_, names)) => names.push(branch.name),
            None => grouped.push((branch.project, vec![branch.name])),
        }
    }
    grouped
}

impl fmt::Display for PreviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Groups being filtered: {}", self.groups)?;
        writeln!(f, "Total projects found: {}", self.projects.len())?;

        if self.projects.is_empty() {
            return writeln!(f, "No projects found in groups: {}", self.groups);
        }

        writeln!(f, "\nProjects found:")?;
        for preview in &self.projects {
            let project = &preview.project;
            writeln!(f, "- {}", project.path)?;
            writeln!(f, "  ID: {}", project.id)?;
            writeln!(f, "  Group: {}", project.top_level_group())?;
            writeln!(
                f,
                "  Default branch: {}",
                project.default_branch.as_deref().unwrap_or("none")
            )?;
        }

        for preview in self.projects.iter().filter(|p| !p.hotfix_branches.is_empty()) {
            writeln!(f, "\nProject: {}", preview.project.path)?;
            writeln!(f, "Hotfix branches found:")?;
            for name in &preview.hotfix_branches {
                writeln!(f, "- {name}")?;
            }
        }

        writeln!(f, "\nTotal hotfix branches found: {}", self.total_hotfix_branches())?;

        if self.would_delete.is_empty() {
            return writeln!(f, "No hotfix branches found to delete.");
        }

        writeln!(f, "\nBranches that would be deleted:")?;
        for (project, names) in &self.would_delete {
            writeln!(f, "\nIn {project}:")?;
            for name in names {
                writeln!(f, "- {name}")?;
            }
        }
        Ok(())
    }
}
