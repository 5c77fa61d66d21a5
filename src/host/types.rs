//! Project host data structures

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Identifier of a project on the host
///
/// Hosts accept either the numeric id or the full namespace path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectId {
    Numeric(u64),
    Path(String),
}

impl ProjectId {
    /// Check whether this id refers to the given project
    pub fn matches(&self, project: &Project) -> bool {
        match self {
            ProjectId::Numeric(_) => *self == project.id,
            ProjectId::Path(path) => path.eq_ignore_ascii_case(&project.path),
        }
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectId::Numeric(id) => write!(f, "{id}"),
            ProjectId::Path(path) => f.write_str(path),
        }
    }
}

impl FromStr for ProjectId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<u64>() {
            Ok(id) => ProjectId::Numeric(id),
            Err(_) => ProjectId::Path(trimmed.to_string()),
        })
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

/// A project as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Canonical identifier
    pub id: ProjectId,
    /// Slash-separated namespace path, e.g. `group/subgroup/repo`
    pub path: String,
    /// Default branch name, if the repository has one
    pub default_branch: Option<String>,
}

impl Project {
    pub fn new(id: u64, path: impl Into<String>) -> Self {
        Self {
            id: ProjectId::Numeric(id),
            path: path.into(),
            default_branch: None,
        }
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = Some(branch.into());
        self
    }

    /// Top-level namespace segment (the whole path when it has no `/`)
    pub fn top_level_group(&self) -> &str {
        self.path.split('/').next().unwrap_or(&self.path)
    }
}

/// A branch snapshot fetched from the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    /// Creation time of the branch's latest commit
    pub created_at: Option<DateTime<Utc>>,
}

impl Branch {
    pub fn new(name: impl Into<String>, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            created_at,
        }
    }
}
