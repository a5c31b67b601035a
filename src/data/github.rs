//! GitHub GraphQL API client
//!
//! Fetches the authenticated user's public, non-fork repositories and
//! normalizes them into `ProjectRecord`s.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{ProjectRecord, LANG_NONE};
use crate::cli::AppConfig;

/// GitHub GraphQL endpoint
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Default upstream request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The viewer's first 100 public, non-fork repositories, newest first
pub const PROJECTS_QUERY: &str = r#"{
  viewer {
    repositories(first: 100, ownerAffiliations: OWNER, isFork: false,
                 orderBy: {field: CREATED_AT, direction: DESC}, privacy: PUBLIC) {
      nodes {
        name
        description
        url
        createdAt
        stargazerCount
        primaryLanguage { name color }
      }
    }
  }
}"#;

/// Errors that can occur when fetching projects from GitHub
///
/// Cloneable so one failed refresh can be reported to every caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network failure or timeout reaching GitHub
    #[error("GitHub request failed: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// GitHub answered with a non-success status
    #[error("GitHub API returned {0}")]
    UpstreamStatus(StatusCode),

    /// Response body did not have the expected shape
    #[error("Unexpected GitHub response: {0}")]
    DataShape(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(Arc::new(err))
    }
}

impl FetchError {
    /// Upstream status code, when GitHub responded with one
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::UpstreamStatus(code) => Some(*code),
            _ => None,
        }
    }
}

/// A source of project records
///
/// The cache only depends on this seam, so it can be exercised without the network.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Performs one upstream fetch and returns the normalized records
    async fn fetch(&self) -> Result<Vec<ProjectRecord>, FetchError>;
}

/// Client for the GitHub GraphQL API
#[derive(Clone)]
pub struct GithubClient {
    http_client: Client,
    token: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GithubClient {
    /// Creates a new GithubClient authenticating with the given token
    pub fn new(token: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            token,
            endpoint: GITHUB_GRAPHQL_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a GithubClient from the application configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.github_token.clone())
            .with_endpoint(config.graphql_url.clone())
            .with_timeout(config.upstream_timeout)
    }

    /// Overrides the GraphQL endpoint (used for testing)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_projects(&self) -> Result<Vec<ProjectRecord>, FetchError> {
        let mut request = self
            .http_client
            .post(&self.endpoint)
            .header(USER_AGENT, concat!("repofolio/", env!("CARGO_PKG_VERSION")))
            .json(&serde_json::json!({ "query": PROJECTS_QUERY }))
            .timeout(self.timeout);

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus(status));
        }

        let body = response.bytes().await?;
        parse_projects(&body)
    }
}

#[async_trait]
impl ProjectSource for GithubClient {
    async fn fetch(&self) -> Result<Vec<ProjectRecord>, FetchError> {
        self.fetch_projects().await
    }
}

/// Parses a GraphQL response body into project records
///
/// Missing or null levels on the `data.viewer.repositories.nodes` path yield
/// an empty list; malformed nodes are rejected.
fn parse_projects(body: &[u8]) -> Result<Vec<ProjectRecord>, FetchError> {
    let response: GraphQlResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::DataShape(e.to_string()))?;

    if let Some(errors) = response.errors.as_deref().filter(|e| !e.is_empty()) {
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        tracing::warn!(?messages, "GitHub GraphQL response contained errors");
    }

    let nodes = response
        .data
        .and_then(|d| d.viewer)
        .and_then(|v| v.repositories)
        .and_then(|r| r.nodes)
        .unwrap_or_default();

    nodes.into_iter().map(transform_node).collect()
}

/// Transforms one raw repository node into a ProjectRecord
pub fn transform_node(node: Value) -> Result<ProjectRecord, FetchError> {
    let node: RepositoryNode = serde_json::from_value(node)
        .map_err(|e| FetchError::DataShape(format!("Invalid repository node: {}", e)))?;

    let year = node.created_at.get(..4).ok_or_else(|| {
        FetchError::DataShape(format!("Invalid createdAt: {:?}", node.created_at))
    })?;

    Ok(ProjectRecord {
        year: year.to_string(),
        title: node.name,
        stars: node.stargazer_count,
        lang: node
            .primary_language
            .map(|l| l.name)
            .unwrap_or_else(|| LANG_NONE.to_string()),
        link: node.url,
    })
}

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ViewerData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Option<Viewer>,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    repositories: Option<RepositoryConnection>,
}

#[derive(Debug, Deserialize)]
struct RepositoryConnection {
    nodes: Option<Vec<Value>>,
}

/// A repository node as returned by GitHub
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name: String,
    url: String,
    created_at: String,
    stargazer_count: u64,
    primary_language: Option<Language>,
}

#[derive(Debug, Deserialize)]
struct Language {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Sample GitHub GraphQL response with two repositories
    const VALID_RESPONSE: &str = r##"{
        "data": {
            "viewer": {
                "repositories": {
                    "nodes": [
                        {
                            "name": "repo1",
                            "description": "First repo",
                            "url": "https://x/repo1",
                            "createdAt": "2021-05-01T00:00:00Z",
                            "stargazerCount": 5,
                            "primaryLanguage": { "name": "Go", "color": "#00ADD8" }
                        },
                        {
                            "name": "notes",
                            "description": null,
                            "url": "https://x/notes",
                            "createdAt": "2019-11-20T08:15:00Z",
                            "stargazerCount": 0,
                            "primaryLanguage": null
                        }
                    ]
                }
            }
        }
    }"##;

    #[test]
    fn test_parse_valid_response() {
        let projects = parse_projects(VALID_RESPONSE.as_bytes()).expect("Failed to parse");

        assert_eq!(
            projects,
            vec![
                ProjectRecord {
                    title: "repo1".to_string(),
                    year: "2021".to_string(),
                    stars: 5,
                    lang: "Go".to_string(),
                    link: "https://x/repo1".to_string(),
                },
                ProjectRecord {
                    title: "notes".to_string(),
                    year: "2019".to_string(),
                    stars: 0,
                    lang: "None".to_string(),
                    link: "https://x/notes".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_missing_primary_language_maps_to_none() {
        let node = json!({
            "name": "bare",
            "url": "https://x/bare",
            "createdAt": "2023-01-01T00:00:00Z",
            "stargazerCount": 1
        });

        let record = transform_node(node).expect("Failed to transform node");
        assert_eq!(record.lang, LANG_NONE);
    }

    #[test]
    fn test_missing_navigation_levels_yield_empty_list() {
        for body in [
            r#"{}"#,
            r#"{"data": null}"#,
            r#"{"data": {}}"#,
            r#"{"data": {"viewer": {}}}"#,
            r#"{"data": {"viewer": {"repositories": null}}}"#,
            r#"{"data": {"viewer": {"repositories": {"nodes": []}}}}"#,
        ] {
            let projects = parse_projects(body.as_bytes()).expect("Should not fail");
            assert!(projects.is_empty(), "Expected empty list for {}", body);
        }
    }

    #[test]
    fn test_graphql_errors_without_data_yield_empty_list() {
        let body = r#"{"data": null, "errors": [{"message": "Bad credentials"}]}"#;
        let projects = parse_projects(body.as_bytes()).expect("Should not fail");
        assert!(projects.is_empty());
    }

    #[test]
    fn test_parse_malformed_json() {
        let result = parse_projects(b"{ invalid json }");
        assert!(matches!(result, Err(FetchError::DataShape(_))));
    }

    #[test]
    fn test_node_missing_required_field_is_data_shape_error() {
        let node = json!({
            "url": "https://x/anon",
            "createdAt": "2023-01-01T00:00:00Z",
            "stargazerCount": 1
        });

        let err = transform_node(node).unwrap_err();
        assert!(matches!(err, FetchError::DataShape(_)));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_short_created_at_is_data_shape_error() {
        let node = json!({
            "name": "odd",
            "url": "https://x/odd",
            "createdAt": "20",
            "stargazerCount": 1
        });

        assert!(matches!(transform_node(node), Err(FetchError::DataShape(_))));
    }

    #[test]
    fn test_negative_star_count_is_data_shape_error() {
        let node = json!({
            "name": "odd",
            "url": "https://x/odd",
            "createdAt": "2020-01-01T00:00:00Z",
            "stargazerCount": -3
        });

        assert!(matches!(transform_node(node), Err(FetchError::DataShape(_))));
    }

    #[test]
    fn test_status_code_only_for_upstream_status() {
        let err = FetchError::UpstreamStatus(StatusCode::UNAUTHORIZED);
        assert_eq!(err.status_code(), Some(StatusCode::UNAUTHORIZED));

        let err = FetchError::DataShape("bad".to_string());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_raw_string_fixture_keeps_hash_inside_value() {
        let json: Value = serde_json::from_str(VALID_RESPONSE).expect("Fixture should be valid JSON");
        assert_eq!(
            json["data"]["viewer"]["repositories"]["nodes"][0]["primaryLanguage"]["color"],
            "#00ADD8"
        );
    }

    #[test]
    fn test_cloned_error_keeps_status() {
        let err = FetchError::UpstreamStatus(StatusCode::BAD_GATEWAY);
        assert_eq!(err.clone().status_code(), Some(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GithubClient::new(Some("ghp_secret".to_string()));
        let debug = format!("{:?}", client);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_builder_overrides() {
        let client = GithubClient::new(None)
            .with_endpoint("http://localhost:9999/graphql")
            .with_timeout(Duration::from_secs(2));

        assert_eq!(client.endpoint, "http://localhost:9999/graphql");
        assert_eq!(client.timeout, Duration::from_secs(2));
        assert!(client.token.is_none());
    }
}
