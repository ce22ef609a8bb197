//! Repository data source abstraction used by the analyzer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    CommitSummary, Contributor, DirectoryEntry, LanguageBytes, RepoRef, RepositoryRecord,
};
use crate::error::Result;

/// Abstraction over the hosting API for testability.
///
/// Every method maps to one upstream request. Implementations must not retry;
/// failures are returned to the caller, which decides whether they are fatal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Fetch repository metadata.
    async fn repository(&self, repo: &RepoRef) -> Result<RepositoryRecord>;
    /// Fetch bytes per language.
    async fn languages(&self, repo: &RepoRef) -> Result<LanguageBytes>;
    /// Fetch contributors in upstream order.
    async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>>;
    /// Fetch commits authored since the given instant.
    async fn commits_since(&self, repo: &RepoRef, since: DateTime<Utc>)
    -> Result<Vec<CommitSummary>>;
    /// List one directory; an empty path lists the repository root.
    async fn list_directory(&self, repo: &RepoRef, path: &str) -> Result<Vec<DirectoryEntry>>;
    /// List every entry reachable from a branch.
    async fn list_tree(&self, repo: &RepoRef, branch: &str) -> Result<Vec<DirectoryEntry>>;
    /// Whether a file or directory exists at the path.
    async fn path_exists(&self, repo: &RepoRef, path: &str) -> Result<bool>;
    /// Read a file as UTF-8 text.
    async fn read_file(&self, repo: &RepoRef, path: &str) -> Result<String>;
}
