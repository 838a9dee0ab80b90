pub mod woodpecker;

pub use woodpecker::{
    GitContext, GitContextAnalyzer, ReportCache, ReportGenerator, WoodpeckerClient,
    WoodpeckerLocator,
};
