use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use crate::error::{Result, WoodlensError};

use super::client::PipelineApi;
use super::status::PipelineStatus;
use super::types::{parse_list, PipelineSummary, RepoSummary};

/// Loose identification of a pipeline, as an IDE knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitContext {
    pub repo_name: String,
    pub pull_request_number: String,
    pub branch_name: Option<String>,
}

/// Concrete pipeline a `GitContext` points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPipeline {
    pub repo_id: String,
    pub pipeline_number: String,
    pub status: PipelineStatus,
}

/// Maps a repository name and PR number to the latest pipeline for it.
#[async_trait]
pub trait PipelineLocator: Send + Sync {
    async fn resolve_latest_pipeline(&self, context: &GitContext) -> Result<ResolvedPipeline>;
}

/// Locator backed by the Woodpecker repository and pipeline listings.
pub struct WoodpeckerLocator {
    api: Arc<dyn PipelineApi>,
}

impl WoodpeckerLocator {
    pub fn new(api: Arc<dyn PipelineApi>) -> Self {
        Self { api }
    }

    async fn find_repo(&self, repo_name: &str) -> Result<RepoSummary> {
        let body = self.api.list_repos().await?.into_body()?;
        let mut repos: Vec<RepoSummary> = parse_list(body, "repository list")?;

        let wanted = repo_name.to_lowercase();
        let by_full_name = repos
            .iter()
            .position(|repo| repo.full_name.to_lowercase() == wanted);
        let index = by_full_name
            .or_else(|| repos.iter().position(|repo| repo.name.to_lowercase() == wanted))
            .ok_or_else(|| WoodlensError::RepoNotFound(repo_name.to_string()))?;

        Ok(repos.swap_remove(index))
    }
}

#[async_trait]
impl PipelineLocator for WoodpeckerLocator {
    async fn resolve_latest_pipeline(&self, context: &GitContext) -> Result<ResolvedPipeline> {
        let repo = self.find_repo(&context.repo_name).await?;
        debug!("Repository {} has id {}", context.repo_name, repo.id);

        let body = self.api.list_pipelines(&repo.id).await?.into_body()?;
        let pipelines: Vec<PipelineSummary> = parse_list(body, "pipeline list")?;

        let pipeline = latest(&pipelines, |p| {
            is_pull_request_ref(p.ref_.as_deref(), &context.pull_request_number)
        })
        .or_else(|| {
            let branch = context.branch_name.as_deref()?;
            latest(&pipelines, |p| p.branch.as_deref() == Some(branch))
        })
        .ok_or_else(|| WoodlensError::NoPipelineForPullRequest {
            repo: context.repo_name.clone(),
            pull_request: context.pull_request_number.clone(),
        })?;

        info!(
            "Resolved {} PR #{} to pipeline {} of repository {}",
            context.repo_name, context.pull_request_number, pipeline.number, repo.id
        );

        Ok(ResolvedPipeline {
            repo_id: repo.id,
            pipeline_number: pipeline.number.clone(),
            status: PipelineStatus::parse(&pipeline.status),
        })
    }
}

/// Highest-numbered pipeline matching `predicate`.
fn latest<'a>(
    pipelines: &'a [PipelineSummary],
    predicate: impl Fn(&PipelineSummary) -> bool,
) -> Option<&'a PipelineSummary> {
    pipelines
        .iter()
        .filter(|p| predicate(p))
        .max_by_key(|p| p.number.parse::<u64>().unwrap_or(0))
}

// Head refs forges use for PRs: GitHub/Gitea/Forgejo and GitLab.
fn is_pull_request_ref(ref_: Option<&str>, pull_request_number: &str) -> bool {
    let Some(ref_) = ref_ else {
        return false;
    };

    [
        format!("refs/pull/{pull_request_number}/head"),
        format!("refs/pull/{pull_request_number}/merge"),
        format!("refs/merge-requests/{pull_request_number}/head"),
    ]
    .iter()
    .any(|candidate| candidate == ref_)
}
