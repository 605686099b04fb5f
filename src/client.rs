use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{DashboardError, Result};
use crate::types::{Job, RefreshStatus, Run};

/// HTTP client for the jobs backend.
///
/// Only knows the backend's small REST surface: the job and run listings and
/// the two refresh triggers.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<Token>,
}

impl ApiClient {
    /// Creates a client for the backend served at `base_url`.
    ///
    /// Endpoint paths are resolved relative to `base_url`, so a dashboard
    /// mounted under a sub-path (e.g. `https://host/dbt/`) works as well.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid absolute URL or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jobboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut base_url = Url::parse(base_url)
            .map_err(|e| DashboardError::Config(format!("Invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!(
                "Invalid base URL: {base_url} cannot hold API paths"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DashboardError::Config(format!("Invalid endpoint URL {path}: {e}")))
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.auth_request(request).send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("GET {url}");
        self.send(self.client.get(url)).await
    }

    async fn post_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {url}");
        self.send(self.client.post(url)).await
    }

    /// Fetches every configured job.
    pub async fn fetch_jobs(&self) -> Result<Vec<Job>> {
        let jobs: Vec<Job> = self.get_json("api/jobs").await?;
        info!("Fetched {} jobs", jobs.len());
        Ok(jobs)
    }

    /// Fetches the most recent runs known to the backend.
    pub async fn fetch_runs(&self) -> Result<Vec<Run>> {
        let runs: Vec<Run> = self.get_json("api/runs").await?;
        info!("Fetched {} runs", runs.len());
        Ok(runs)
    }

    /// Asks the backend to reload recent runs from dbt Cloud.
    pub async fn refresh_runs(&self) -> Result<RefreshStatus> {
        info!("Requesting run refresh");
        self.post_json("api/refresh/runs").await
    }

    /// Asks the backend to reload projects, environments, jobs and runs.
    pub async fn refresh_all(&self) -> Result<RefreshStatus> {
        info!("Requesting full data refresh");
        self.post_json("api/refresh/all").await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    Err(DashboardError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const JOBS_BODY: &str = r#"[
        {"job_id": 1, "dbt_id": 11, "project_name": "analytics", "enviornment_name": "prod", "name": "nightly"},
        {"job_id": 2, "dbt_id": 12, "project_name": "analytics", "enviornment_name": "prod", "name": "hourly"}
    ]"#;

    const RUNS_BODY: &str = r#"[
        {
            "dbt_id": 500,
            "environment_name": "prod",
            "project_name": "analytics",
            "job_name": "nightly",
            "git_branch": "main",
            "git_hash": "deadbeef",
            "started_at": "2024-03-01T10:00:00Z",
            "finished_at": "2024-03-01T10:05:30Z",
            "is_error": false,
            "duration": "0:05:30"
        }
    ]"#;

    #[test]
    fn test_new_appends_trailing_slash() {
        let client = ApiClient::new("https://jobs.example.com/dbt", None).unwrap();
        assert_eq!(client.base_url().as_str(), "https://jobs.example.com/dbt/");
        assert_eq!(
            client.endpoint("api/jobs").unwrap().as_str(),
            "https://jobs.example.com/dbt/api/jobs"
        );
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = ApiClient::new("not a url", None);
        assert!(matches!(result, Err(DashboardError::Config(_))));

        let result = ApiClient::new("mailto:ops@example.com", None);
        assert!(matches!(result, Err(DashboardError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_jobs_and_runs() {
        let mut server = mockito::Server::new_async().await;
        let jobs_mock = server
            .mock("GET", "/api/jobs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(JOBS_BODY)
            .create_async()
            .await;
        let runs_mock = server
            .mock("GET", "/api/runs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(RUNS_BODY)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), None).unwrap();

        let jobs = client.fetch_jobs().await.unwrap();
        let runs = client.fetch_runs().await.unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].environment_name, "prod");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].git_hash.as_deref(), Some("deadbeef"));
        jobs_mock.assert_async().await;
        runs_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_sent_as_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/jobs")
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), Some(Token::from("s3cret"))).unwrap();
        let jobs = client.fetch_jobs().await.unwrap();

        assert!(jobs.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/runs")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), None).unwrap();
        tokio_test::assert_ok!(client.fetch_runs().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/runs")
            .with_status(500)
            .with_body("database is locked")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), None).unwrap();
        let err = client.fetch_runs().await.unwrap_err();

        match err {
            DashboardError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database is locked");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/jobs")
            .with_status(200)
            .with_body(r#"{"not": "a list"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), None).unwrap();
        let result = client.fetch_jobs().await;
        assert!(matches!(result, Err(DashboardError::Json(_))));
    }

    #[tokio::test]
    async fn test_refresh_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let runs_mock = server
            .mock("POST", "/api/refresh/runs")
            .with_status(200)
            .with_body(r#"{"status": "success"}"#)
            .create_async()
            .await;
        let all_mock = server
            .mock("POST", "/api/refresh/all")
            .with_status(200)
            .with_body(r#"{"status": "success"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), None).unwrap();

        assert_eq!(client.refresh_runs().await.unwrap().status, "success");
        assert_eq!(client.refresh_all().await.unwrap().status, "success");
        runs_mock.assert_async().await;
        all_mock.assert_async().await;
    }
}
