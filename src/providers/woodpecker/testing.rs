use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{Result, WoodlensError};

use super::client::{ApiResponse, PipelineApi};
use super::links;

#[derive(Clone)]
enum Reply {
    Answer(StatusCode, Value, Duration),
    Unreachable,
}

/// In-memory `PipelineApi` keyed by request path, recording every call.
#[derive(Default)]
pub struct FakeApi {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, path: impl Into<String>, status: u16, body: Value) -> &Self {
        self.reply_after(path, status, body, Duration::ZERO)
    }

    pub fn reply_after(
        &self,
        path: impl Into<String>,
        status: u16,
        body: Value,
        delay: Duration,
    ) -> &Self {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.replies
            .lock()
            .insert(path.into(), Reply::Answer(status, body, delay));
        self
    }

    pub fn unreachable(&self, path: impl Into<String>) -> &Self {
        self.replies.lock().insert(path.into(), Reply::Unreachable);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    async fn get(&self, path: String) -> Result<ApiResponse> {
        self.calls.lock().push(path.clone());
        let reply = self.replies.lock().get(&path).cloned();

        match reply {
            Some(Reply::Answer(status, body, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(ApiResponse::new(status, body))
            }
            Some(Reply::Unreachable) => Err(WoodlensError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            None => Ok(ApiResponse::new(StatusCode::NOT_FOUND, Value::Null)),
        }
    }
}

#[async_trait]
impl PipelineApi for FakeApi {
    async fn fetch_pipeline(&self, repo_id: &str, pipeline_number: &str) -> Result<ApiResponse> {
        self.get(links::pipeline_path(repo_id, pipeline_number)).await
    }

    async fn fetch_step_log(
        &self,
        repo_id: &str,
        pipeline_number: &str,
        step_id: &str,
    ) -> Result<ApiResponse> {
        self.get(links::step_log_path(repo_id, pipeline_number, step_id)).await
    }

    async fn list_repos(&self) -> Result<ApiResponse> {
        self.get(links::repos_path()).await
    }

    async fn list_pipelines(&self, repo_id: &str) -> Result<ApiResponse> {
        self.get(links::repo_pipelines_path(repo_id)).await
    }
}
