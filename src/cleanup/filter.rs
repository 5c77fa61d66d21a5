//! Group-based project filtering

use crate::host::Project;
use std::collections::BTreeSet;
use std::fmt;
use tracing::info;

/// Allow-list of top-level groups
///
/// Names are stored lowercased. An empty filter lets every project through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    groups: BTreeSet<String>,
}

impl GroupFilter {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            groups: groups
                .into_iter()
                .map(|g| g.as_ref().trim().to_lowercase())
                .filter(|g| !g.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list such as `"TeamA, teamB"`
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Check whether a project's top-level namespace is allowed
    pub fn allows(&self, project: &Project) -> bool {
        self.is_empty()
            || self
                .groups
                .contains(&project.top_level_group().to_lowercase())
    }

    /// Keep the projects whose top-level group is in the filter
    pub fn apply(&self, projects: Vec<Project>, verbose: bool) -> Vec<Project> {
        if self.is_empty() {
            return projects;
        }

        if verbose {
            info!("Filtering projects for groups: {}", self);
        }

        projects.into_iter().filter(|p| self.allows(p)).collect()
    }
}

impl fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<&str> = self.groups().collect();
        f.write_str(&groups.join(", "))
    }
}
