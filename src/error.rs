use thiserror::Error;

#[derive(Error, Debug)]
pub enum WoodlensError {
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("No pipeline found for {repo} PR #{pull_request}")]
    NoPipelineForPullRequest { repo: String, pull_request: String },
}

pub type Result<T> = std::result::Result<T, WoodlensError>;
