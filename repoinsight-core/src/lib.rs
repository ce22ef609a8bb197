#![deny(missing_docs)]
//! RepoInsight core library.
//!
//! This crate contains the domain types, the GitHub data source and the
//! heuristic analysis steps shared by the RepoInsight server and CLI.

pub mod analysis;
pub mod commits;
pub mod domain;
pub mod error;
pub mod github;
pub mod metrics;
pub mod report;
pub mod scores;
pub mod source;
pub mod techstack;
#[cfg(test)]
mod testing;
pub mod vulnerabilities;

pub use analysis::{AnalysisInputs, Analyzer, AnalyzerOptions, build_result};
pub use commits::bin_commits;
pub use domain::{
    AnalysisResult, CodeMetrics, CommitDay, Confidence, Contributor, DetectedTechnology,
    FileTypeStat, RepoRef, ScoreTriple, Severity, TechCategory, VulnerabilityFinding,
};
pub use error::{InsightError, Result};
pub use github::{GitHubConfig, GitHubSource};
pub use metrics::estimate_metrics;
pub use report::{AnalysisStatus, RepoReport, format_file_types, render_json, render_markdown};
pub use scores::compute_scores;
pub use source::RepositorySource;
pub use techstack::detect_tech_stack;
pub use vulnerabilities::assess_vulnerabilities;
