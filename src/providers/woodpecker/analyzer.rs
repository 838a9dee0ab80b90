use std::sync::Arc;

use log::{info, warn};

use super::locator::{GitContext, PipelineLocator};
use super::report::ReportGenerator;
use super::status::PipelineStatus;

/// Answers "why did CI fail for this PR" from git context alone.
///
/// The PR is resolved on every call because new commits keep adding
/// pipelines; only the per-pipeline report below is cached.
pub struct GitContextAnalyzer {
    locator: Arc<dyn PipelineLocator>,
    reports: ReportGenerator,
}

impl GitContextAnalyzer {
    pub fn new(locator: Arc<dyn PipelineLocator>, reports: ReportGenerator) -> Self {
        Self { locator, reports }
    }

    /// Resolves the latest pipeline for the PR and returns its report. Never fails.
    pub async fn analyze(&self, context: &GitContext) -> String {
        info!(
            "Resolving latest pipeline details for: {} PR #{}",
            context.repo_name, context.pull_request_number
        );

        let resolved = match self.locator.resolve_latest_pipeline(context).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(
                    "Could not resolve {} PR #{}: {e}",
                    context.repo_name, context.pull_request_number
                );
                return format!(
                    "Error analyzing pipeline for {} PR #{}: {e}",
                    context.repo_name, context.pull_request_number
                );
            }
        };

        if resolved.status == PipelineStatus::Running {
            return format!(
                "Pipeline for repository '{}' PR #{} is currently running. Please wait for it to complete before analyzing failures.",
                context.repo_name, context.pull_request_number
            );
        }

        info!(
            "Analyzing pipeline {} for repository {}",
            resolved.pipeline_number, resolved.repo_id
        );

        self.reports
            .generate_report(&resolved.repo_id, &resolved.pipeline_number)
            .await
    }
}
