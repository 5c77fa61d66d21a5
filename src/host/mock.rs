//! In-memory project host for testing
//!
//! Serves a fixed set of projects and branches, records every call, and can
//! be told to fail specific operations.

use super::{Branch, HostError, HostResult, Project, ProjectHost, ProjectId};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// A call observed by [`MockProjectHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    ListProjects,
    GetProject(ProjectId),
    ListBranches(ProjectId),
    DeleteBranch { project: ProjectId, branch: String },
}

#[derive(Debug, Clone)]
struct MockRepository {
    project: Project,
    branches: Vec<Branch>,
}

/// Mock implementation of ProjectHost
#[derive(Default)]
pub struct MockProjectHost {
    repositories: Mutex<Vec<MockRepository>>,
    fail_project_listing: bool,
    failing_branch_lists: HashSet<String>,
    failing_deletes: HashSet<(String, String)>,
    calls: Mutex<Vec<HostCall>>,
}

impl MockProjectHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project together with its branches
    pub fn with_project(mut self, project: Project, branches: Vec<Branch>) -> Self {
        self.repositories
            .get_mut()
            .push(MockRepository { project, branches });
        self
    }

    /// Make `list_accessible_projects` fail
    pub fn fail_project_listing(mut self) -> Self {
        self.fail_project_listing = true;
        self
    }

    /// Make `list_branches` fail for the project at `path`
    pub fn fail_branch_listing(mut self, path: &str) -> Self {
        self.failing_branch_lists.insert(path.to_lowercase());
        self
    }

    /// Make deleting `branch` from the project at `path` fail
    pub fn fail_delete(mut self, path: &str, branch: &str) -> Self {
        self.failing_deletes
            .insert((path.to_lowercase(), branch.to_string()));
        self
    }

    /// Every call made so far, in order
    pub async fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().await.clone()
    }

    /// Branch names passed to `delete_branch`, in order
    pub async fn delete_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                HostCall::DeleteBranch { branch, .. } => Some(branch.clone()),
                _ => None,
            })
            .collect()
    }

    /// Branches still present on a project
    pub async fn remaining_branches(&self, path: &str) -> Vec<String> {
        self.repositories
            .lock()
            .await
            .iter()
            .find(|repo| repo.project.path.eq_ignore_ascii_case(path))
            .map(|repo| repo.branches.iter().map(|b| b.name.clone()).collect())
            .unwrap_or_default()
    }

    async fn record(&self, call: HostCall) {
        self.calls.lock().await.push(call);
    }

    async fn find(&self, id: &ProjectId) -> HostResult<MockRepository> {
        self.repositories
            .lock()
            .await
            .iter()
            .find(|repo| id.matches(&repo.project))
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("project {id}")))
    }
}

#[async_trait]
impl ProjectHost for MockProjectHost {
    async fn list_accessible_projects(&self) -> HostResult<Vec<Project>> {
        self.record(HostCall::ListProjects).await;
        if self.fail_project_listing {
            return Err(HostError::Other("simulated project listing failure".to_string()));
        }
        Ok(self
            .repositories
            .lock()
            .await
            .iter()
            .map(|repo| repo.project.clone())
            .collect())
    }

    async fn get_project(&self, id: &ProjectId) -> HostResult<Project> {
        self.record(HostCall::GetProject(id.clone())).await;
        Ok(self.find(id).await?.project)
    }

    async fn list_branches(&self, project: &ProjectId) -> HostResult<Vec<Branch>> {
        self.record(HostCall::ListBranches(project.clone())).await;
        let repo = self.find(project).await?;
        if self
            .failing_branch_lists
            .contains(&repo.project.path.to_lowercase())
        {
            return Err(HostError::Other("simulated branch listing failure".to_string()));
        }
        Ok(repo.branches)
    }

    async fn delete_branch(&self, project: &ProjectId, branch: &str) -> HostResult<()> {
        self.record(HostCall::DeleteBranch {
            project: project.clone(),
            branch: branch.to_string(),
        })
        .await;

        let path = self.find(project).await?.project.path.to_lowercase();
        if self
            .failing_deletes
            .contains(&(path.clone(), branch.to_string()))
        {
            return Err(HostError::Status {
                status: 500,
                body: "simulated delete failure".to_string(),
            });
        }

        let mut repositories = self.repositories.lock().await;
        let repo = repositories
            .iter_mut()
            .find(|repo| repo.project.path.to_lowercase() == path)
            .ok_or_else(|| HostError::NotFound(format!("project {project}")))?;
        let before = repo.branches.len();
        repo.branches.retain(|b| b.name != branch);
        if repo.branches.len() == before {
            return Err(HostError::NotFound(format!("branch {branch}")));
        }
        Ok(())
    }
}
