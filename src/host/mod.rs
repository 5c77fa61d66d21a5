//! Project host boundary
//!
//! The cleanup core only talks to the hosting service through the
//! [`ProjectHost`] trait, so tests can swap in [`MockProjectHost`] and the
//! binary wires up [`GitLabClient`].

pub mod error;
pub mod gitlab;
pub mod mock;
pub mod types;

pub use error::HostError;
pub use gitlab::GitLabClient;
pub use mock::{HostCall, MockProjectHost};
pub use types::{Branch, Project, ProjectId};

use async_trait::async_trait;

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Operations the cleanup core needs from a project host
#[async_trait]
pub trait ProjectHost: Send + Sync {
    /// List every project the authenticated user is a member of
    async fn list_accessible_projects(&self) -> HostResult<Vec<Project>>;

    /// Resolve a project by id or path
    async fn get_project(&self, id: &ProjectId) -> HostResult<Project>;

    /// List all branches of a project, in host order
    async fn list_branches(&self, project: &ProjectId) -> HostResult<Vec<Branch>>;

    /// Delete a branch from a project
    async fn delete_branch(&self, project: &ProjectId, branch: &str) -> HostResult<()>;
}
