use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::join_all;
use log::{debug, warn};
use serde::Serialize;

use super::client::PipelineApi;
use super::status::FailedStep;
use super::types::{parse_list, LogEntry};

/// Decoded log of one failed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLog {
    pub workflow_name: String,
    pub step_name: String,
    /// Decoded lines in the order the server returned them
    pub log: Vec<String>,
    pub is_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fetches the logs of all given steps concurrently.
///
/// One failing fetch never aborts the others: its entry carries an error
/// instead. The returned logs are in the same order as `steps`.
pub async fn fetch_step_logs(
    api: &dyn PipelineApi,
    repo_id: &str,
    pipeline_number: &str,
    steps: &[FailedStep],
) -> Vec<StepLog> {
    debug!(
        "Fetching logs for {} failed steps of pipeline {pipeline_number}",
        steps.len()
    );

    let futures: Vec<_> = steps
        .iter()
        .map(|step| fetch_step_log(api, repo_id, pipeline_number, step))
        .collect();

    join_all(futures).await
}

async fn fetch_step_log(
    api: &dyn PipelineApi,
    repo_id: &str,
    pipeline_number: &str,
    step: &FailedStep,
) -> StepLog {
    let mut result = StepLog {
        workflow_name: step.workflow_name.clone(),
        step_name: step.step_name.clone(),
        log: Vec::new(),
        is_success: false,
        error: None,
    };

    let failure = |reason: String| {
        format!(
            "Failed to fetch log for step {} for a workflow {}: {reason}",
            step.step_name, step.workflow_name
        )
    };

    let response = match api
        .fetch_step_log(repo_id, pipeline_number, &step.step_id)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!("Log request for step {} failed: {e}", step.step_id);
            result.error = Some(failure(e.to_string()));
            return result;
        }
    };

    if !response.is_success() {
        warn!(
            "Log request for step {} answered {}",
            step.step_id, response.status
        );
        result.error = Some(failure(response.status.to_string()));
        return result;
    }

    match parse_list::<LogEntry>(response.body, "step log") {
        Ok(entries) => {
            result.log = decode_entries(&entries);
            result.is_success = true;
        }
        Err(e) => result.error = Some(failure(e.to_string())),
    }

    result
}

/// Decodes the base64 payloads of log records, skipping records without one.
fn decode_entries(entries: &[LogEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| entry.data.as_deref())
        .map(|data| match STANDARD.decode(data) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Keeping undecodable log payload as-is: {e}");
                data.to_string()
            }
        })
        .collect()
}
