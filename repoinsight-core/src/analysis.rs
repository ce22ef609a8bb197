//! End-to-end repository analysis.
//!
//! [`Analyzer`] fetches everything it needs from a [`RepositorySource`] and
//! hands the collected [`AnalysisInputs`] to [`build_result`], which is pure
//! apart from the injected random source.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Local, Utc};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::commits::bin_commits;
use crate::domain::{
    AnalysisResult, CommitSummary, Contributor, DetectedTechnology, DirectoryEntry, RepoRef,
    RepositorySnapshot,
};
use crate::error::{InsightError, Result};
use crate::metrics::estimate_metrics;
use crate::scores::compute_scores;
use crate::source::RepositorySource;
use crate::techstack::detect_tech_stack;
use crate::vulnerabilities::assess_vulnerabilities;

/// Contributors kept in a result.
pub const MAX_CONTRIBUTORS: usize = 10;

/// Days of commit history fetched for scoring.
pub const DEFAULT_COMMIT_HISTORY_DAYS: i64 = 365;

/// Tunables for [`Analyzer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Seed for the coverage estimate; `None` draws from OS entropy.
    pub coverage_seed: Option<u64>,
    /// How far back commits are fetched.
    pub commit_history_days: i64,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            coverage_seed: None,
            commit_history_days: DEFAULT_COMMIT_HISTORY_DAYS,
        }
    }
}

impl AnalyzerOptions {
    /// Read `REPOINSIGHT_COVERAGE_SEED` from the environment.
    pub fn from_env() -> Result<Self> {
        let coverage_seed = match std::env::var("REPOINSIGHT_COVERAGE_SEED") {
            Ok(value) if !value.trim().is_empty() => Some(value.trim().parse().map_err(|_| {
                InsightError::Other(format!("invalid REPOINSIGHT_COVERAGE_SEED: {value}"))
            })?),
            _ => None,
        };
        Ok(Self {
            coverage_seed,
            ..Self::default()
        })
    }

    fn rng(&self) -> StdRng {
        match self.coverage_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Everything fetched for one repository.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisInputs {
    /// Metadata, language histogram and top-level listing.
    pub snapshot: RepositorySnapshot,
    /// Recursive tree listing, when it could be fetched.
    pub tree: Option<Vec<DirectoryEntry>>,
    /// Every contributor in upstream order.
    pub contributors: Vec<Contributor>,
    /// Commits from the history window.
    pub commits: Vec<CommitSummary>,
    /// Detected technologies.
    pub tech_stack: Vec<DetectedTechnology>,
}

/// Runs analyses against a repository source.
#[derive(Clone)]
pub struct Analyzer {
    source: Arc<dyn RepositorySource>,
    options: AnalyzerOptions,
}

impl Analyzer {
    /// Analyzer with default options.
    pub fn new(source: Arc<dyn RepositorySource>) -> Self {
        Self::with_options(source, AnalyzerOptions::default())
    }

    /// Analyzer with explicit options.
    pub fn with_options(source: Arc<dyn RepositorySource>, options: AnalyzerOptions) -> Self {
        Self { source, options }
    }

    /// Options in effect.
    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyze a repository relative to the local clock.
    pub async fn analyze(&self, repo: &RepoRef) -> Result<AnalysisResult> {
        self.analyze_at(repo, Local::now().fixed_offset()).await
    }

    /// Analyze a repository as of `now`.
    ///
    /// The commit series uses `now`'s offset for day boundaries. Failing to
    /// fetch metadata, languages, contributors, commits or the top-level
    /// listing fails the whole analysis; a missing tree listing only degrades
    /// the file count.
    pub async fn analyze_at(
        &self,
        repo: &RepoRef,
        now: DateTime<FixedOffset>,
    ) -> Result<AnalysisResult> {
        info!("analyzing {repo}");
        let source = self.source.as_ref();
        let record = source.repository(repo).await?;
        let since = now.with_timezone(&Utc) - Duration::days(self.options.commit_history_days);

        let (languages, contributors, commits, listing, tree, tech_stack) = futures::join!(
            source.languages(repo),
            source.contributors(repo),
            source.commits_since(repo, since),
            source.list_directory(repo, ""),
            source.list_tree(repo, &record.default_branch),
            detect_tech_stack(source, repo),
        );

        let tree = match tree {
            Ok(entries) => Some(entries),
            Err(err) => {
                warn!("tree listing for {repo} unavailable, estimating file count: {err}");
                None
            }
        };
        let inputs = AnalysisInputs {
            snapshot: RepositorySnapshot {
                record,
                languages: languages?,
                listing: listing?,
            },
            tree,
            contributors: contributors?,
            commits: commits?,
            tech_stack,
        };

        let result = build_result(inputs, &now, &mut self.options.rng())?;
        info!(
            "analyzed {repo}: {} lines, {} technologies, {} findings",
            result.code_metrics.total_lines,
            result.tech_stack.len(),
            result.vulnerabilities.len()
        );
        Ok(result)
    }
}

/// Derive an [`AnalysisResult`] from fetched inputs.
pub fn build_result<R: Rng + ?Sized>(
    inputs: AnalysisInputs,
    now: &DateTime<FixedOffset>,
    rng: &mut R,
) -> Result<AnalysisResult> {
    let AnalysisInputs {
        snapshot,
        tree,
        mut contributors,
        commits,
        tech_stack,
    } = inputs;
    let RepositorySnapshot {
        record,
        languages,
        listing,
    } = snapshot;

    let estimate = estimate_metrics(&languages, &listing, tree.as_deref(), rng)?;
    let scores = compute_scores(&record, commits.len(), contributors.len());
    let analyzed_at = now.with_timezone(&Utc);
    let vulnerabilities = assess_vulnerabilities(&record, &tech_stack, analyzed_at);
    contributors.truncate(MAX_CONTRIBUTORS);

    Ok(AnalysisResult {
        repository: record.full_name(),
        analyzed_at,
        code_metrics: estimate.metrics,
        scores,
        commits: bin_commits(&commits, now),
        contributors,
        file_types: estimate.file_types,
        vulnerabilities,
        tech_stack,
    })
}
