use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::auth::Token;
use crate::config::ServerSettings;
use crate::error::{Result, WoodlensError};

use super::links;

/// Raw answer from the Woodpecker API.
///
/// A non-2xx status is not an error at this level: callers decide how to
/// report it. Only faults that prevent getting any answer are `Err`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Unwraps the body of a 2xx answer, turning anything else into an API error.
    pub fn into_body(self) -> Result<Value> {
        if self.is_success() {
            return Ok(self.body);
        }

        let message = match &self.body {
            Value::Null => self
                .status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
            body => body.to_string(),
        };

        Err(WoodlensError::Api {
            status: self.status.as_u16(),
            message,
        })
    }
}

/// Read access to the Woodpecker endpoints the report needs.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// `GET repos/{repo_id}/pipelines/{pipeline_number}`
    async fn fetch_pipeline(&self, repo_id: &str, pipeline_number: &str) -> Result<ApiResponse>;

    /// `GET repos/{repo_id}/logs/{pipeline_number}/{step_id}`
    async fn fetch_step_log(
        &self,
        repo_id: &str,
        pipeline_number: &str,
        step_id: &str,
    ) -> Result<ApiResponse>;

    /// `GET repos`
    async fn list_repos(&self) -> Result<ApiResponse>;

    /// `GET repos/{repo_id}/pipelines`
    async fn list_pipelines(&self, repo_id: &str) -> Result<ApiResponse>;
}

pub struct WoodpeckerClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

impl WoodpeckerClient {
    pub fn new(settings: &ServerSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(concat!("woodlens/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| WoodlensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = links::api_base(&settings.server_url)?;

        Ok(Self {
            client,
            api_url,
            token: settings.auth_token.clone(),
        })
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let url = self
            .api_url
            .join(path)
            .map_err(|e| WoodlensError::Config(format!("Invalid API URL for {path}: {e}")))?;

        debug!("GET {url}");

        let response = self.auth_request(self.client.get(url)).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Error pages are often HTML; keep going with an empty body.
        let body = if status.is_success() {
            serde_json::from_str(&text)?
        } else {
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };

        debug!("{path} answered {status}");

        Ok(ApiResponse::new(status, body))
    }
}

#[async_trait]
impl PipelineApi for WoodpeckerClient {
    async fn fetch_pipeline(&self, repo_id: &str, pipeline_number: &str) -> Result<ApiResponse> {
        self.get(&links::pipeline_path(repo_id, pipeline_number)).await
    }

    async fn fetch_step_log(
        &self,
        repo_id: &str,
        pipeline_number: &str,
        step_id: &str,
    ) -> Result<ApiResponse> {
        self.get(&links::step_log_path(repo_id, pipeline_number, step_id)).await
    }

    async fn list_repos(&self) -> Result<ApiResponse> {
        self.get(&links::repos_path()).await
    }

    async fn list_pipelines(&self, repo_id: &str) -> Result<ApiResponse> {
        self.get(&links::repo_pipelines_path(repo_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(server_url: &str, token: Option<&str>) -> ServerSettings {
        ServerSettings {
            server_url: server_url.to_string(),
            auth_token: token.map(Token::from),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_fetch_pipeline_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/repos/42/pipelines/7")
            .match_header("authorization", "Bearer wp-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"number": 7, "status": "success"}"#)
            .create_async()
            .await;

        let client = WoodpeckerClient::new(&settings(&server.url(), Some("wp-token"))).unwrap();
        let response = client.fetch_pipeline("42", "7").await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.body["status"], "success");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_json_error_body_becomes_null() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/repos/42/logs/7/99")
            .with_status(500)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = WoodpeckerClient::new(&settings(&server.url(), None)).unwrap();
        let response = client.fetch_step_log("42", "7", "99").await.unwrap();

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_json_on_success_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/repos")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = WoodpeckerClient::new(&settings(&server.url(), None)).unwrap();
        let err = client.list_repos().await.unwrap_err();

        assert!(matches!(err, WoodlensError::Json(_)));
    }

    #[tokio::test]
    async fn test_server_url_with_api_suffix() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/repos/5/pipelines")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let url = format!("{}/api", server.url());
        let client = WoodpeckerClient::new(&settings(&url, None)).unwrap();
        let response = client.list_pipelines("5").await.unwrap();

        assert_eq!(response.body, Value::Array(vec![]));
        mock.assert_async().await;
    }

    #[test]
    fn test_into_body_maps_status_to_api_error() {
        let response = ApiResponse::new(StatusCode::NOT_FOUND, Value::Null);
        match response.into_body().unwrap_err() {
            WoodlensError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
