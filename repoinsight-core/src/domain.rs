//! Domain entities for RepoInsight.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::InsightError;

/// A mapping of language names to the number of bytes written in them.
pub type LanguageBytes = BTreeMap<String, u64>;

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RepoRef {
    /// Account or organization owning the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoRef {
    /// Create a reference from an owner and repository name.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Returns `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = InsightError;

    /// Accepts `owner/name` as well as HTTPS and SSH GitHub URLs.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let path = trimmed
            .strip_prefix("https://github.com/")
            .or_else(|| trimmed.strip_prefix("http://github.com/"))
            .or_else(|| trimmed.strip_prefix("git@github.com:"))
            .unwrap_or(trimmed);
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let mut parts = path.split('/');
        let owner = parts.next().filter(|part| !part.is_empty());
        let name = parts.next().filter(|part| !part.is_empty());
        match (owner, name, parts.next()) {
            (Some(owner), Some(name), None) if !owner.contains(':') => Ok(Self::new(owner, name)),
            _ => Err(InsightError::InvalidRepository(trimmed.to_string())),
        }
    }
}

/// Kind of an entry in a directory or tree listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Dir,
    /// A symbolic link.
    Symlink,
    /// A git submodule.
    Submodule,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DirectoryEntry {
    /// Entry name (last path segment).
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// Entry kind.
    pub kind: EntryKind,
}

impl DirectoryEntry {
    /// Build an entry, deriving the name from the last path segment.
    pub fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { name, path, kind }
    }
}

/// Repository metadata as reported by the hosting API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Primary language.
    pub language: Option<String>,
    /// Stargazer count.
    pub stars: u64,
    /// Fork count.
    pub forks: u64,
    /// Watcher count.
    pub watchers: u64,
    /// Open issue count.
    pub open_issues: u64,
    /// Whether the repository is private.
    pub private: bool,
    /// License name, if one is recorded.
    pub license: Option<String>,
    /// Whether the issue tracker is enabled.
    pub has_issues: bool,
    /// Whether the wiki is enabled.
    pub has_wiki: bool,
    /// Whether pages are enabled.
    pub has_pages: bool,
    /// Whether projects are enabled.
    pub has_projects: bool,
    /// Homepage URL.
    pub homepage: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Default branch name.
    pub default_branch: String,
}

impl RepositoryRecord {
    /// Returns `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Whether a non-blank description is present.
    pub fn has_description(&self) -> bool {
        is_present(self.description.as_deref())
    }

    /// Whether a non-blank homepage is present.
    pub fn has_homepage(&self) -> bool {
        is_present(self.homepage.as_deref())
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.map(|value| !value.trim().is_empty()).unwrap_or(false)
}

/// Everything fetched about a repository for a single analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositorySnapshot {
    /// Repository metadata.
    pub record: RepositoryRecord,
    /// Bytes per language.
    pub languages: LanguageBytes,
    /// Top-level directory listing.
    pub listing: Vec<DirectoryEntry>,
}

/// A repository contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    /// Contributor login.
    pub login: String,
    /// Number of contributions.
    pub contributions: u64,
    /// Avatar image URL.
    pub avatar_url: String,
}

/// A commit reduced to what the commit binner needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Commit SHA.
    pub sha: String,
    /// Author timestamp.
    pub authored_at: DateTime<Utc>,
}

/// How a technology was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Declared dependency or marker file.
    High,
    /// Substring match against a package name.
    Medium,
}

/// Category label of a detected technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TechCategory {
    /// Programming language.
    Language,
    /// Language runtime.
    Runtime,
    /// Application framework.
    Framework,
    /// Database client or ORM.
    #[serde(rename = "Database/ORM")]
    Database,
    /// Bundler or build system.
    #[serde(rename = "Build Tool")]
    BuildTool,
    /// Test framework.
    Testing,
    /// Continuous integration.
    #[serde(rename = "CI/CD")]
    CiCd,
    /// Container tooling.
    DevOps,
    /// Infrastructure as code.
    Infrastructure,
    /// Styling library.
    Styling,
    /// Linter or formatter.
    Linting,
    /// State management library.
    #[serde(rename = "State Management")]
    StateManagement,
    /// General-purpose library.
    Library,
    /// API layer.
    #[serde(rename = "API")]
    Api,
}

impl TechCategory {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Language => "Language",
            Self::Runtime => "Runtime",
            Self::Framework => "Framework",
            Self::Database => "Database/ORM",
            Self::BuildTool => "Build Tool",
            Self::Testing => "Testing",
            Self::CiCd => "CI/CD",
            Self::DevOps => "DevOps",
            Self::Infrastructure => "Infrastructure",
            Self::Styling => "Styling",
            Self::Linting => "Linting",
            Self::StateManagement => "State Management",
            Self::Library => "Library",
            Self::Api => "API",
        }
    }
}

impl fmt::Display for TechCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A technology found in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetectedTechnology {
    /// Display name, unique within a detection result.
    pub name: String,
    /// Category label.
    pub category: TechCategory,
    /// Detection confidence.
    pub confidence: Confidence,
    /// Declared version string, when read from a manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Icon slug for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Approximate size and quality metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetrics {
    /// Estimated line count (bytes / 50); an approximation, not a count.
    pub total_lines: u64,
    /// File count from the tree listing, or estimated from lines.
    pub total_files: u64,
    /// Heuristic complexity anchor.
    pub avg_complexity: f64,
    /// Heuristic test coverage percentage, partly randomized.
    pub test_coverage: u8,
}

/// Estimated size of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileTypeStat {
    /// Language name.
    pub name: String,
    /// Estimated file count.
    pub files: u64,
    /// Estimated line count.
    pub lines: u64,
}

/// Output of the code-metrics estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsEstimate {
    /// Aggregate metrics.
    pub metrics: CodeMetrics,
    /// Per-language breakdown.
    pub file_types: Vec<FileTypeStat>,
}

/// The three heuristic quality scores, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTriple {
    /// Security score.
    pub security_score: u8,
    /// Maintainability score.
    pub maintainability_score: u8,
    /// Documentation score.
    pub documentation_score: u8,
}

/// Severity of a heuristic finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

impl Severity {
    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A human-readable heuristic finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VulnerabilityFinding {
    /// Finding severity.
    pub severity: Severity,
    /// Short title.
    pub title: String,
    /// Longer explanation.
    pub description: String,
}

/// Number of commits authored on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommitDay {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    /// Commits on that day.
    pub count: u32,
}

/// Full analysis of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Repository full name (`owner/name`).
    pub repository: String,
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
    /// Aggregate code metrics.
    pub code_metrics: CodeMetrics,
    /// Quality scores.
    #[serde(flatten)]
    pub scores: ScoreTriple,
    /// Last 30 days of commits, oldest first.
    pub commits: Vec<CommitDay>,
    /// Top contributors, at most 10.
    pub contributors: Vec<Contributor>,
    /// Per-language size estimate.
    pub file_types: Vec<FileTypeStat>,
    /// Heuristic findings.
    pub vulnerabilities: Vec<VulnerabilityFinding>,
    /// Detected technologies, at most 20.
    pub tech_stack: Vec<DetectedTechnology>,
}
