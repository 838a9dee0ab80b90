//! Diagnoses failed Woodpecker CI pipelines.
//!
//! [`providers::ReportGenerator`] turns a repository id and pipeline number
//! into a plain-text report of the failed steps and their logs.
//! [`providers::GitContextAnalyzer`] does the same starting from a
//! repository name and pull request number.

pub mod auth;
pub mod config;
pub mod error;
pub mod providers;
