//! Process configuration
//!
//! Read once from the environment at startup. Lookups go through a closure so
//! tests can supply their own variables.

use crate::cleanup::selector::DEFAULT_HOTFIX_PREFIX;
use crate::cleanup::{CleanupSettings, GroupFilter, HotfixPolicy};
use crate::error::{Error, Result};
use crate::host::gitlab::DEFAULT_GITLAB_URL;
use crate::host::ProjectId;
use secrecy::SecretString;
use tracing::warn;
use url::Url;

pub const TOKEN_VAR: &str = "GITLAB_TOKEN";
pub const URL_VAR: &str = "GITLAB_URL";
pub const GROUP_FILTER_VAR: &str = "GROUP_FILTER";
pub const PROJECT_OVERRIDE_VAR: &str = "TEST_PROJECT_ID";
pub const RUN_IMMEDIATELY_VAR: &str = "TEST_RUN";
pub const HOTFIX_PREFIX_VAR: &str = "HOTFIX_PREFIX";

#[derive(Debug)]
pub struct SweeperConfig {
    pub token: SecretString,
    pub base_url: Url,
    pub group_filter: GroupFilter,
    pub project_override: Option<ProjectId>,
    pub run_immediately: bool,
    pub hotfix_prefix: String,
}

impl SweeperConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = non_blank(TOKEN_VAR).ok_or(Error::MissingEnv(TOKEN_VAR))?;

        let raw_url = non_blank(URL_VAR).unwrap_or_else(|| DEFAULT_GITLAB_URL.to_string());
        let base_url = Url::parse(raw_url.trim()).map_err(|e| Error::InvalidEnv {
            name: URL_VAR,
            reason: format!("{raw_url:?}: {e}"),
        })?;

        let group_filter = non_blank(GROUP_FILTER_VAR)
            .map(|raw| GroupFilter::parse(&raw))
            .unwrap_or_default();

        let project_override =
            non_blank(PROJECT_OVERRIDE_VAR).map(|raw| ProjectId::from(raw.as_str()));

        let run_immediately =
            non_blank(RUN_IMMEDIATELY_VAR).is_some_and(|raw| parse_flag(RUN_IMMEDIATELY_VAR, &raw));

        let hotfix_prefix = non_blank(HOTFIX_PREFIX_VAR)
            .map(|raw| raw.trim().to_lowercase())
            .unwrap_or_else(|| DEFAULT_HOTFIX_PREFIX.to_string());

        Ok(Self {
            token: SecretString::new(token.trim().into()),
            base_url,
            group_filter,
            project_override,
            run_immediately,
            hotfix_prefix,
        })
    }

    /// Settings for the cleanup executor
    pub fn cleanup_settings(&self) -> CleanupSettings {
        CleanupSettings {
            group_filter: self.group_filter.clone(),
            policy: HotfixPolicy::new(&self.hotfix_prefix),
            project_override: self.project_override.clone(),
        }
    }
}

/// Unrecognized values switch the flag off
fn parse_flag(name: &str, raw: &str) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        other => {
            warn!("Ignoring unrecognized {} value {:?}, treating it as false", name, other);
            false
        }
    }
}
