use async_trait::async_trait;
use reqwest::{
    Response, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{Build, ErrorResponse, ListOptions};

/// Errors returned by Drone API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid Drone host: {0}")]
    InvalidHost(String),

    #[error("Drone token contains characters not allowed in an HTTP header")]
    InvalidToken,

    #[error("Request to Drone failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Drone returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Failed to parse Drone response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// The subset of the Drone REST API used for purging.
#[async_trait]
pub trait DroneApi: Send + Sync {
    /// Lists one page of builds, newest first.
    async fn list_builds(
        &self,
        namespace: &str,
        repo: &str,
        opts: ListOptions,
    ) -> Result<Vec<Build>, ApiError>;

    /// Fetches a single build including its stages and steps.
    async fn get_build(&self, namespace: &str, repo: &str, number: i64)
    -> Result<Build, ApiError>;

    /// Deletes the log of one step.
    async fn purge_logs(
        &self,
        namespace: &str,
        repo: &str,
        build: i64,
        stage: i64,
        step: i64,
    ) -> Result<(), ApiError>;

    /// Deletes every build numbered below `before`, as decided by the server.
    async fn purge_builds(&self, namespace: &str, repo: &str, before: i64)
    -> Result<(), ApiError>;
}

/// HTTP client for a Drone server, authenticated with a static bearer token.
#[derive(Debug, Clone)]
pub struct DroneClient {
    base: Url,
    http: reqwest::Client,
}

impl DroneClient {
    /// Builds a client for `host`. No request is made.
    pub fn new(host: &str, token: &SecretString) -> Result<Self, ApiError> {
        let base = Url::parse(host).map_err(|e| ApiError::InvalidHost(format!("{host}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidHost(host.to_string()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("drone-purge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { base, http })
    }

    // Returns {host}/api/repos/{namespace}/{repo}/{tail...}
    fn repo_url(&self, namespace: &str, repo: &str, tail: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidHost(self.base.to_string()))?
            .pop_if_empty()
            .extend(["api", "repos", namespace, repo])
            .extend(tail);
        Ok(url)
    }
}

#[async_trait]
impl DroneApi for DroneClient {
    async fn list_builds(
        &self,
        namespace: &str,
        repo: &str,
        opts: ListOptions,
    ) -> Result<Vec<Build>, ApiError> {
        let url = self.repo_url(namespace, repo, &["builds"])?;
        debug!(%url, page = opts.page, size = opts.size, "Listing builds");

        let response = self.http.get(url).query(&opts.query()).send().await?;
        decode(check(response).await?).await
    }

    async fn get_build(
        &self,
        namespace: &str,
        repo: &str,
        number: i64,
    ) -> Result<Build, ApiError> {
        let number = number.to_string();
        let url = self.repo_url(namespace, repo, &["builds", &number])?;
        debug!(%url, "Fetching build");

        let response = self.http.get(url).send().await?;
        decode(check(response).await?).await
    }

    async fn purge_logs(
        &self,
        namespace: &str,
        repo: &str,
        build: i64,
        stage: i64,
        step: i64,
    ) -> Result<(), ApiError> {
        let (build, stage, step) = (build.to_string(), stage.to_string(), step.to_string());
        let url = self.repo_url(namespace, repo, &["builds", &build, "logs", &stage, &step])?;
        debug!(%url, "Deleting step log");

        let response = self.http.delete(url).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn purge_builds(
        &self,
        namespace: &str,
        repo: &str,
        before: i64,
    ) -> Result<(), ApiError> {
        let url = self.repo_url(namespace, repo, &["builds"])?;
        debug!(%url, before, "Deleting builds");

        let response = self
            .http
            .delete(url)
            .query(&[("before", before)])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

/// Turns a non-success response into `ApiError::Status`, keeping the server's message if any.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|e| e.message)
        .unwrap_or_else(|_| format!("HTTP {status}"));
    Err(ApiError::Status { status, message })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response.json().await.map_err(ApiError::Decode)
}
