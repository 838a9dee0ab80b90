use url::Url;

use crate::error::{Result, WoodlensError};

/// Derives the Woodpecker API base from the configured server URL.
///
/// The server may be given with or without the `/api` suffix; both
/// resolve to the same base with a trailing slash so relative paths join
/// underneath it.
///
/// # Examples
///
/// `https://ci.example.com` and `https://ci.example.com/api/` both become
/// `https://ci.example.com/api/`.
pub fn api_base(server_url: &str) -> Result<Url> {
    let trimmed = server_url.trim().trim_end_matches('/');
    let base = if trimmed.ends_with("/api") {
        format!("{trimmed}/")
    } else {
        format!("{trimmed}/api/")
    };

    Url::parse(&base).map_err(|e| WoodlensError::Config(format!("Invalid server URL: {e}")))
}

/// Path of a pipeline status document, relative to the API base.
pub fn pipeline_path(repo_id: &str, pipeline_number: &str) -> String {
    format!("repos/{repo_id}/pipelines/{pipeline_number}")
}

/// Path of the log records for one step, relative to the API base.
pub fn step_log_path(repo_id: &str, pipeline_number: &str, step_id: &str) -> String {
    format!("repos/{repo_id}/logs/{pipeline_number}/{step_id}")
}

pub fn repos_path() -> String {
    "repos".to_string()
}

pub fn repo_pipelines_path(repo_id: &str) -> String {
    format!("repos/{repo_id}/pipelines")
}
