use log::{info, warn};

use crate::error::{Result, WoodlensError};

use super::client::PipelineApi;
use super::logs::fetch_step_logs;
use super::status::{extract_pipeline_result, PipelineResult, PipelineStatus};
use super::types::PipelineDocument;

/// Rendered report text plus whether it describes a final pipeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    /// False for anything that may read differently on the next query
    pub cacheable: bool,
}

impl Report {
    fn terminal(text: String) -> Self {
        Self {
            text,
            cacheable: true,
        }
    }

    fn transient(text: String) -> Self {
        Self {
            text,
            cacheable: false,
        }
    }
}

/// Fetches a pipeline, interprets it and renders the report text.
///
/// HTTP failures are rendered into the report. Only a fault that prevents
/// reaching the server at all is returned as `Err`.
pub async fn resolve_report(
    api: &dyn PipelineApi,
    repo_id: &str,
    pipeline_number: &str,
) -> Result<Report> {
    info!("Fetching pipeline {pipeline_number} of repository {repo_id}");

    let response = api.fetch_pipeline(repo_id, pipeline_number).await?;

    let result = if response.is_success() {
        match PipelineDocument::from_value(response.body) {
            Ok(document) => extract_pipeline_result(&document),
            Err(e) => {
                warn!("Pipeline {pipeline_number} of repository {repo_id}: {e}");
                let detail = match e {
                    WoodlensError::MalformedResponse(detail) => detail,
                    other => other.to_string(),
                };
                return Ok(Report::transient(format!(
                    "Pipeline {pipeline_number} returned a malformed response: {detail}"
                )));
            }
        }
    } else {
        PipelineResult::fetch_failed(&response)
    };

    let PipelineResult {
        pull_request_url,
        failed_steps,
        status,
        error,
        ..
    } = result;

    if let Some(error) = error {
        return Ok(Report::terminal(error));
    }

    match status {
        status @ (PipelineStatus::Running | PipelineStatus::Pending) => {
            Ok(Report::transient(format!(
                "Pipeline {pipeline_number} is currently {status}. Please wait for it to complete."
            )))
        }
        PipelineStatus::Success => Ok(Report::terminal(format!(
            "Pipeline {pipeline_number} for PR {pull_request_url} completed successfully. No failed steps detected."
        ))),
        PipelineStatus::Other(other) => Ok(Report::transient(format!(
            "Pipeline {pipeline_number} for PR {pull_request_url} finished with status '{other}'. No failed steps to report."
        ))),
        PipelineStatus::Failure => {
            info!(
                "Pipeline {pipeline_number} failed with {} failed steps",
                failed_steps.len()
            );

            let logs = fetch_step_logs(api, repo_id, pipeline_number, &failed_steps).await;
            let details = serde_json::to_string_pretty(&logs)?;

            Ok(Report::terminal(format!(
                "Pipeline {pipeline_number} for PR {pull_request_url} has failed.\n\nFailed steps details:\n{details}"
            )))
        }
    }
}
