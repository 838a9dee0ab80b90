use std::fmt;

use super::client::ApiResponse;
use super::types::{PipelineDocument, WorkflowDocument};

/// Snapshot status of a pipeline as reported by Woodpecker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Success,
    Running,
    Pending,
    Failure,
    /// Any other Woodpecker status (killed, error, skipped, blocked, ...)
    Other(String),
}

impl PipelineStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "success" => Self::Success,
            "running" => Self::Running,
            "pending" => Self::Pending,
            "failure" => Self::Failure,
            other => Self::Other(other.to_string()),
        }
    }

    /// Running and pending pipelines will still change; nothing about them is final.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Running | Self::Pending)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Running => f.write_str("running"),
            Self::Pending => f.write_str("pending"),
            Self::Failure => f.write_str("failure"),
            Self::Other(status) => f.write_str(status),
        }
    }
}

/// A step that failed inside a failed workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedStep {
    /// "<workflow> on <runner>" when the runner is known
    pub workflow_name: String,
    pub step_id: String,
    pub step_name: String,
}

/// Interpretation of one pipeline status document.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub is_success: bool,
    pub pull_request_url: String,
    /// Only ever non-empty when `status` is `Failure`
    pub failed_steps: Vec<FailedStep>,
    pub status: PipelineStatus,
    /// Set when the status document itself could not be fetched
    pub error: Option<String>,
}

impl PipelineResult {
    /// Builds the result for a status fetch that came back non-2xx.
    ///
    /// Whatever part of the body is readable still provides the PR link.
    pub fn fetch_failed(response: &ApiResponse) -> Self {
        let pull_request_url = response
            .body
            .get("forge_url")
            .and_then(|url| url.as_str())
            .filter(|url| !url.is_empty())
            .unwrap_or("unknown")
            .to_string();

        Self {
            is_success: false,
            pull_request_url,
            failed_steps: Vec::new(),
            status: PipelineStatus::Other("unknown".to_string()),
            error: Some(format!(
                "Failed to fetch pipeline details: {}",
                response.status
            )),
        }
    }
}

/// Turns a pipeline status document into a `PipelineResult`.
///
/// Only steps that failed inside a failed workflow are reported; a failed
/// pipeline may still contain workflows and steps that passed.
pub fn extract_pipeline_result(document: &PipelineDocument) -> PipelineResult {
    let status = PipelineStatus::parse(&document.status);

    let mut result = PipelineResult {
        is_success: status == PipelineStatus::Success,
        pull_request_url: pull_request_url(document),
        failed_steps: Vec::new(),
        status,
        error: None,
    };

    if result.status != PipelineStatus::Failure {
        return result;
    }

    result.failed_steps = document
        .workflows
        .iter()
        .filter(|workflow| workflow.state == "failure")
        .flat_map(failed_steps_of)
        .collect();

    result
}

fn failed_steps_of(workflow: &WorkflowDocument) -> impl Iterator<Item = FailedStep> + '_ {
    let workflow_name = match workflow
        .environ
        .as_ref()
        .and_then(|environ| environ.runner.as_deref())
    {
        Some(runner) => format!("{} on {}", workflow.name, runner),
        None => workflow.name.clone(),
    };

    workflow
        .children
        .iter()
        .filter(|step| step.state == "failure")
        .map(move |step| FailedStep {
            workflow_name: workflow_name.clone(),
            step_id: step.id.clone(),
            step_name: step.name.clone(),
        })
}

fn pull_request_url(document: &PipelineDocument) -> String {
    document
        .forge_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .or_else(|| document.link.as_deref().filter(|link| !link.is_empty()))
        .map(ToString::to_string)
        .unwrap_or_else(|| {
            format!(
                "Pipeline #{}",
                document.number.as_deref().unwrap_or("unknown")
            )
        })
}
