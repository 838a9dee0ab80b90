pub mod analyzer;
pub mod cache;
pub mod client;
pub mod links;
pub mod locator;
pub mod logs;
pub mod report;
pub mod resolver;
pub mod status;
#[cfg(test)]
mod testing;
pub mod types;

pub use analyzer::GitContextAnalyzer;
pub use cache::ReportCache;
pub use client::{PipelineApi, WoodpeckerClient};
pub use locator::{GitContext, PipelineLocator, WoodpeckerLocator};
pub use report::ReportGenerator;
