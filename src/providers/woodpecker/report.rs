use std::sync::Arc;

use log::{info, warn};

use super::cache::{CacheKey, ReportCache};
use super::client::PipelineApi;
use super::resolver::resolve_report;

/// Entry point for pipeline reports.
///
/// Reports of finished pipelines are served from the cache so that
/// polling a known result does not hit the CI server again.
#[derive(Clone)]
pub struct ReportGenerator {
    api: Arc<dyn PipelineApi>,
    cache: Arc<ReportCache>,
}

impl ReportGenerator {
    pub fn new(api: Arc<dyn PipelineApi>, cache: Arc<ReportCache>) -> Self {
        Self { api, cache }
    }

    /// Returns the report for one pipeline. Never fails: errors come back as text.
    pub async fn generate_report(&self, repo_id: &str, pipeline_number: &str) -> String {
        let key = CacheKey::new(repo_id, pipeline_number);

        if let Some(cached) = self.cache.get(&key) {
            info!("Returning cached pipeline report for key: {key}");
            return cached;
        }

        match resolve_report(self.api.as_ref(), repo_id, pipeline_number).await {
            Ok(report) => {
                if report.cacheable {
                    self.cache.set(key, report.text.clone());
                }
                report.text
            }
            Err(e) => {
                warn!("Could not analyze pipeline {key}: {e}");
                format!("Error analyzing pipeline {pipeline_number}: {e}")
            }
        }
    }
}
