use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Result, WoodlensError};

/// Pipeline status document returned by `repos/{id}/pipelines/{number}`.
///
/// Only the fields the report needs are kept; everything else in the
/// Woodpecker payload is ignored.
#[derive(Debug, Clone)]
pub struct PipelineDocument {
    /// Pipeline number within the repository
    pub number: Option<String>,
    /// Overall pipeline status (e.g., "success", "failure", "running")
    pub status: String,
    /// Link back to the PR or commit on the forge
    pub forge_url: Option<String>,
    /// Generic link, used when the forge URL is missing
    pub link: Option<String>,
    /// Workflows of a failed pipeline; empty for any other status
    pub workflows: Vec<WorkflowDocument>,
}

// Workflows stay raw until the status says they are needed.
#[derive(Deserialize)]
struct RawPipelineDocument {
    #[serde(default, deserialize_with = "opt_id_string")]
    number: Option<String>,
    status: String,
    #[serde(default)]
    forge_url: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    workflows: Option<Value>,
}

/// A workflow (group of steps) within a pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDocument {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub environ: Option<WorkflowEnviron>,
    #[serde(default)]
    pub children: Vec<StepDocument>,
}

/// Runner metadata attached to a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowEnviron {
    #[serde(default)]
    pub runner: Option<String>,
}

/// A single step of a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct StepDocument {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub state: String,
}

/// One record of a step log. `data` holds base64-encoded output.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub data: Option<String>,
}

/// Entry of the repository listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
}

/// Entry of a repository's pipeline listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSummary {
    #[serde(deserialize_with = "id_string")]
    pub number: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "ref", default)]
    pub ref_: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
}

impl PipelineDocument {
    /// Validates a raw status body into a `PipelineDocument`.
    ///
    /// A failed pipeline must carry its workflows, otherwise there is
    /// nothing to explain the failure with.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawPipelineDocument = serde_json::from_value(value)
            .map_err(|e| WoodlensError::MalformedResponse(e.to_string()))?;

        let workflows = if raw.status == "failure" {
            match raw.workflows {
                Some(workflows) => parse_list(workflows, "workflows")?,
                None => {
                    return Err(WoodlensError::MalformedResponse(
                        "failed pipeline has no workflows".to_string(),
                    ))
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            number: raw.number,
            status: raw.status,
            forge_url: raw.forge_url,
            link: raw.link,
            workflows,
        })
    }
}

/// Parses a JSON array body into a list of `T`.
pub fn parse_list<T>(value: Value, what: &str) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value)
        .map_err(|e| WoodlensError::MalformedResponse(format!("{what}: {e}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

// Woodpecker ids are numbers, but callers hand them around as strings.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_ids_become_strings() {
        let document = PipelineDocument::from_value(json!({
            "number": 7,
            "status": "failure",
            "workflows": [{
                "name": "build",
                "state": "failure",
                "children": [{"id": 99, "name": "compile", "state": "failure"}]
            }]
        }))
        .unwrap();

        assert_eq!(document.number.as_deref(), Some("7"));
        assert_eq!(document.workflows[0].children[0].id, "99");
    }

    #[test]
    fn test_missing_status_is_malformed() {
        let err = PipelineDocument::from_value(json!({"number": 1})).unwrap_err();
        assert!(matches!(err, WoodlensError::MalformedResponse(_)));
    }

    #[test]
    fn test_failure_without_workflows_is_malformed() {
        let err = PipelineDocument::from_value(json!({"number": 1, "status": "failure"}))
            .unwrap_err();
        assert!(err.to_string().contains("no workflows"));
    }

    #[test]
    fn test_running_without_workflows_is_fine() {
        let document =
            PipelineDocument::from_value(json!({"number": "3", "status": "running"})).unwrap();
        assert!(document.workflows.is_empty());
    }

    #[test]
    fn test_partial_workflows_ignored_unless_failed() {
        let success = PipelineDocument::from_value(json!({
            "number": 8,
            "status": "success",
            "workflows": [{"name": "build"}]
        }))
        .unwrap();
        assert!(success.workflows.is_empty());

        let running = PipelineDocument::from_value(json!({
            "number": 9,
            "status": "running",
            "workflows": [{
                "name": "build",
                "state": "running",
                "children": [{"name": "compile", "state": "running"}]
            }]
        }))
        .unwrap();
        assert_eq!(running.status, "running");
    }

    #[test]
    fn test_failed_pipeline_with_partial_step_is_malformed() {
        let err = PipelineDocument::from_value(json!({
            "status": "failure",
            "workflows": [{
                "name": "build",
                "state": "failure",
                "children": [{"name": "compile", "state": "failure"}]
            }]
        }))
        .unwrap_err();

        assert_eq!(err.to_string(), "Malformed response: workflows: missing field `id`");
    }

    #[test]
    fn test_parse_pipeline_listing() {
        let pipelines: Vec<PipelineSummary> = parse_list(
            json!([{"number": 12, "status": "success", "ref": "refs/pull/4/head", "event": "pull_request"}]),
            "pipelines",
        )
        .unwrap();

        assert_eq!(pipelines[0].number, "12");
        assert_eq!(pipelines[0].ref_.as_deref(), Some("refs/pull/4/head"));
        assert!(pipelines[0].branch.is_none());
    }

    #[test]
    fn test_parse_list_rejects_objects() {
        let result: Result<Vec<LogEntry>> = parse_list(json!({"data": "x"}), "step log");
        assert!(result.is_err());
    }
}
