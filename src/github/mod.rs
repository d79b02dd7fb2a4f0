use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;

/// Errors from GitHub REST calls.
#[derive(Debug, Error)]
pub enum GithubError {
    /// The API answered with a non-success status.
    #[error("GitHub request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a usable response (connect, timeout,
    /// malformed body).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GithubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GithubError::Status { status, .. } => Some(*status),
            GithubError::Network(_) => None,
        }
    }
}

/// User resource, as far as this crate needs it. The user fetch exists to
/// confirm the profile exists and to surface rate limiting early.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubUser {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubLicense {
    pub spdx_id: Option<String>,
}

/// Repository list entry. Fields default individually so a sparse upstream
/// payload never sinks the whole list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubRepo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub open_issues_count: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    pub license: Option<GithubLicense>,
    pub pushed_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    pub created_at: Option<String>,
}

/// Version of the crate, used in the User-Agent header.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Anonymous client for the GitHub REST API.
///
/// Every request carries a fixed `repolens/<version>` User-Agent; JSON
/// resources negotiate `application/vnd.github+json`, README probes ask for
/// `application/vnd.github.raw`. No authentication and no retries.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
}

impl GithubClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.github.com";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    /// Build a client against a custom base URL (tests, GitHub Enterprise).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("repolens/{VERSION}"))
                .unwrap_or_else(|_| HeaderValue::from_static("repolens")),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_user(&self, username: &str) -> Result<GithubUser, GithubError> {
        let res = self
            .client
            .get(format!("{}/users/{username}", self.base_url))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(status_error(res).await);
        }

        Ok(res.json().await?)
    }

    /// One page of up to 100 repositories, most recently updated first.
    pub async fn list_repos(&self, username: &str) -> Result<Vec<GithubRepo>, GithubError> {
        let res = self
            .client
            .get(format!("{}/users/{username}/repos", self.base_url))
            .query(&[("per_page", "100"), ("sort", "updated")])
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(status_error(res).await);
        }

        Ok(res.json().await?)
    }

    /// Probe a repository README and return its raw length in bytes.
    pub async fn readme_length(&self, full_name: &str) -> Result<usize, GithubError> {
        let res = self
            .client
            .get(format!("{}/repos/{full_name}/readme", self.base_url))
            .header(ACCEPT, "application/vnd.github.raw")
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(status_error(res).await);
        }

        Ok(res.text().await?.len())
    }

    /// One page of up to 100 recent public events.
    pub async fn list_public_events(
        &self,
        username: &str,
    ) -> Result<Vec<GithubEvent>, GithubError> {
        let res = self
            .client
            .get(format!("{}/users/{username}/events/public", self.base_url))
            .query(&[("per_page", "100")])
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(status_error(res).await);
        }

        Ok(res.json().await?)
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a non-success response into a status error, keeping the upstream
/// `message` field when the body carries one.
async fn status_error(res: Response) -> GithubError {
    let status = res.status().as_u16();
    let message = res
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_default();

    GithubError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_points_at_github() {
        let client = GithubClient::new();
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[test]
    fn custom_base_url_is_kept() {
        let client = GithubClient::with_base_url("http://127.0.0.1:9000");
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn status_accessor_distinguishes_error_kinds() {
        let err = GithubError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
    }

    mod http_mock_tests {
        use super::*;
        use serde_json::json;
        use wiremock::matchers::{header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn get_user_parses_login() {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/users/octocat"))
                .and(header("accept", "application/vnd.github+json"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({ "login": "octocat" })),
                )
                .mount(&server)
                .await;

            let client = GithubClient::with_base_url(server.uri());
            let user = client.get_user("octocat").await.expect("user fetch");
            assert_eq!(user.login, "octocat");
        }

        #[tokio::test]
        async fn get_user_surfaces_status_and_message() {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/users/ghost"))
                .respond_with(
                    ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
                )
                .mount(&server)
                .await;

            let client = GithubClient::with_base_url(server.uri());
            let err = client.get_user("ghost").await.expect_err("expected failure");
            match err {
                GithubError::Status { status, message } => {
                    assert_eq!(status, 404);
                    assert_eq!(message, "Not Found");
                }
                other => panic!("expected status error, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn list_repos_requests_one_recency_sorted_page() {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/users/octocat/repos"))
                .and(query_param("per_page", "100"))
                .and(query_param("sort", "updated"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    { "name": "alpha", "full_name": "octocat/alpha" }
                ])))
                .mount(&server)
                .await;

            let client = GithubClient::with_base_url(server.uri());
            let repos = client.list_repos("octocat").await.expect("repo list");
            assert_eq!(repos.len(), 1);
            assert_eq!(repos[0].full_name, "octocat/alpha");
            assert_eq!(repos[0].stargazers_count, 0);
            assert!(repos[0].topics.is_empty());
        }

        #[tokio::test]
        async fn readme_length_counts_raw_bytes() {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/repos/octocat/alpha/readme"))
                .and(header("accept", "application/vnd.github.raw"))
                .respond_with(ResponseTemplate::new(200).set_body_string("# Alpha\n"))
                .mount(&server)
                .await;

            let client = GithubClient::with_base_url(server.uri());
            let length = client
                .readme_length("octocat/alpha")
                .await
                .expect("readme probe");
            assert_eq!(length, 8);
        }

        #[tokio::test]
        async fn readme_length_turns_missing_readme_into_status_error() {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/repos/octocat/bare/readme"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;

            let client = GithubClient::with_base_url(server.uri());
            let err = client
                .readme_length("octocat/bare")
                .await
                .expect_err("expected failure");
            assert_eq!(err.status(), Some(404));
        }

        #[tokio::test]
        async fn list_public_events_parses_event_types() {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/users/octocat/events/public"))
                .and(query_param("per_page", "100"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    { "type": "PushEvent", "created_at": "2024-03-01T12:00:00Z" },
                    { "type": "WatchEvent", "created_at": "2024-03-01T13:00:00Z" }
                ])))
                .mount(&server)
                .await;

            let client = GithubClient::with_base_url(server.uri());
            let events = client
                .list_public_events("octocat")
                .await
                .expect("event list");
            assert_eq!(events.len(), 2);
            assert_eq!(events[0].event_type, "PushEvent");
        }
    }
}
