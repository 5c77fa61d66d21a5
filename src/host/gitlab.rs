//! GitLab REST v4 implementation of [`ProjectHost`]

use super::{Branch, HostError, HostResult, Project, ProjectHost, ProjectId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Public GitLab instance used when no base URL is configured
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

const PER_PAGE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitLab API client authenticated with a personal access token
pub struct GitLabClient {
    http: Client,
    base_url: Url,
    token: SecretString,
}

impl GitLabClient {
    /// Create a new client for the instance at `base_url`
    pub fn new(base_url: Url, token: SecretString) -> HostResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(HostError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("hotfix-sweeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HostError::Client)?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Build an API URL from raw path segments; each segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> HostResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HostError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "v4"])
            .extend(segments);
        Ok(url)
    }

    fn project_endpoint(&self, project: &ProjectId, rest: &[&str]) -> HostResult<Url> {
        let id = project.to_string();
        let mut segments = vec!["projects", id.as_str()];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    async fn send(&self, request: RequestBuilder) -> HostResult<Response> {
        let response = request
            .header("PRIVATE-TOKEN", self.token.expose_secret())
            .send()
            .await
            .map_err(HostError::Transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HostError::Unauthorized {
                status: status.as_u16(),
            },
            StatusCode::NOT_FOUND => HostError::NotFound(url),
            _ => HostError::Status {
                status: status.as_u16(),
                body,
            },
        })
    }

    /// Fetch every page of a list endpoint, following `X-Next-Page`
    async fn get_all_pages<T: DeserializeOwned>(&self, url: Url) -> HostResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            trace!("GET {}", page_url);
            let response = self.send(self.http.get(page_url)).await?;
            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u32>().ok());

            let batch: Vec<T> = response.json().await.map_err(HostError::Decode)?;
            items.extend(batch);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl ProjectHost for GitLabClient {
    async fn list_accessible_projects(&self) -> HostResult<Vec<Project>> {
        let mut url = self.endpoint(&["projects"])?;
        url.query_pairs_mut().append_pair("membership", "true");

        let projects: Vec<ApiProject> = self.get_all_pages(url).await?;
        debug!("GitLab returned {} accessible projects", projects.len());
        Ok(projects.into_iter().map(Project::from).collect())
    }

    async fn get_project(&self, id: &ProjectId) -> HostResult<Project> {
        let url = self.project_endpoint(id, &[])?;
        let response = self.send(self.http.get(url)).await?;
        let project: ApiProject = response.json().await.map_err(HostError::Decode)?;
        Ok(project.into())
    }

    async fn list_branches(&self, project: &ProjectId) -> HostResult<Vec<Branch>> {
        let url = self.project_endpoint(project, &["repository", "branches"])?;
        let branches: Vec<ApiBranch> = self.get_all_pages(url).await?;
        Ok(branches.into_iter().map(Branch::from).collect())
    }

    async fn delete_branch(&self, project: &ProjectId, branch: &str) -> HostResult<()> {
        let url = self.project_endpoint(project, &["repository", "branches", branch])?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

// Wire formats for the subset of fields we read
#[derive(Debug, Deserialize)]
struct ApiProject {
    id: u64,
    path_with_namespace: Option<String>,
    default_branch: Option<String>,
}

impl From<ApiProject> for Project {
    fn from(api: ApiProject) -> Self {
        Project {
            id: ProjectId::Numeric(api.id),
            path: api.path_with_namespace.unwrap_or_default(),
            default_branch: api.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiBranch {
    name: String,
    commit: Option<ApiCommit>,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    created_at: Option<String>,
}

impl From<ApiBranch> for Branch {
    fn from(api: ApiBranch) -> Self {
        let created_at = api
            .commit
            .and_then(|commit| commit.created_at)
            .and_then(|raw| parse_timestamp(&raw));
        Branch {
            name: api.name,
            created_at,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            debug!("Ignoring unparseable commit timestamp {:?}: {}", raw, e);
            None
        }
    }
}
