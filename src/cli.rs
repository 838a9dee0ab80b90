use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use woodlens::config::Config;
use woodlens::providers::{
    GitContext, GitContextAnalyzer, ReportCache, ReportGenerator, WoodpeckerClient,
    WoodpeckerLocator,
};

use crate::output::Progress;

#[derive(Parser)]
#[command(name = "woodlens")]
#[command(author, version, about = "Woodpecker CI failure diagnosis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./woodlens.toml or the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Woodpecker server URL, with or without the trailing /api
    #[arg(short, long, global = true, env = "WOODPECKER_SERVER")]
    server: Option<String>,

    /// Woodpecker personal access token, sent as a bearer token
    #[arg(short, long, global = true, env = "WOODPECKER_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report on a pipeline identified by repository id and pipeline number
    Report {
        #[arg(short, long)]
        repo_id: String,

        #[arg(short, long)]
        pipeline: String,
    },
    /// Report on the latest pipeline of a pull request
    Analyze {
        #[arg(short, long)]
        repo: String,

        #[arg(short = 'P', long)]
        pr: String,

        #[arg(short, long)]
        branch: Option<String>,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let settings = config
            .server_settings(self.server.as_deref(), self.token.as_deref())
            .context("Cannot reach Woodpecker without a server")?;

        info!("Using Woodpecker server: {}", settings.server_url);

        let client = Arc::new(WoodpeckerClient::new(&settings)?);
        let cache = Arc::new(ReportCache::new(config.cache_ttl()));
        let reports = ReportGenerator::new(client.clone(), cache);

        let text = match &self.command {
            Commands::Report { repo_id, pipeline } => {
                let progress = Progress::start(&format!("Analyzing pipeline {pipeline}"));
                let text = reports.generate_report(repo_id, pipeline).await;
                progress.finish(&format!("Analyzed pipeline {pipeline}"));
                text
            }
            Commands::Analyze { repo, pr, branch } => {
                let analyzer =
                    GitContextAnalyzer::new(Arc::new(WoodpeckerLocator::new(client)), reports);
                let context = GitContext {
                    repo_name: repo.clone(),
                    pull_request_number: pr.clone(),
                    branch_name: branch.clone(),
                };

                let progress = Progress::start(&format!("Analyzing {repo} PR #{pr}"));
                let text = analyzer.analyze(&context).await;
                progress.finish(&format!("Analyzed {repo} PR #{pr}"));
                text
            }
        };

        println!("{text}");

        Ok(())
    }
}
