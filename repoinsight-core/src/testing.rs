//! In-memory fixtures shared by unit tests.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{
    CommitSummary, Contributor, DirectoryEntry, EntryKind, LanguageBytes, RepoRef,
    RepositoryRecord,
};
use crate::error::{InsightError, Result};
use crate::source::RepositorySource;

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
}

pub(crate) fn record() -> RepositoryRecord {
    RepositoryRecord {
        owner: "octo".to_string(),
        name: "demo".to_string(),
        description: None,
        language: Some("TypeScript".to_string()),
        stars: 0,
        forks: 0,
        watchers: 0,
        open_issues: 0,
        private: false,
        license: None,
        has_issues: false,
        has_wiki: false,
        has_pages: false,
        has_projects: false,
        homepage: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: fixed_now(),
        default_branch: "main".to_string(),
    }
}

/// Canned repository served from memory.
#[derive(Debug, Clone)]
pub(crate) struct FixtureSource {
    pub(crate) record: RepositoryRecord,
    pub(crate) languages: LanguageBytes,
    pub(crate) contributors: Vec<Contributor>,
    pub(crate) commits: Vec<CommitSummary>,
    pub(crate) files: BTreeMap<String, String>,
    pub(crate) dirs: BTreeSet<String>,
    pub(crate) tree_fails: bool,
}

impl FixtureSource {
    pub(crate) fn new() -> Self {
        Self {
            record: record(),
            languages: LanguageBytes::new(),
            contributors: Vec::new(),
            commits: Vec::new(),
            files: BTreeMap::new(),
            dirs: BTreeSet::new(),
            tree_fails: false,
        }
    }

    pub(crate) fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    pub(crate) fn with_dir(mut self, path: &str) -> Self {
        self.dirs.insert(path.to_string());
        self
    }

    pub(crate) fn with_language(mut self, language: &str, bytes: u64) -> Self {
        self.languages.insert(language.to_string(), bytes);
        self
    }

    fn entries(&self) -> Vec<DirectoryEntry> {
        self.dirs
            .iter()
            .map(|path| DirectoryEntry::new(path.clone(), EntryKind::Dir))
            .chain(
                self.files
                    .keys()
                    .map(|path| DirectoryEntry::new(path.clone(), EntryKind::File)),
            )
            .collect()
    }
}

#[async_trait]
impl RepositorySource for FixtureSource {
    async fn repository(&self, _repo: &RepoRef) -> Result<RepositoryRecord> {
        Ok(self.record.clone())
    }

    async fn languages(&self, _repo: &RepoRef) -> Result<LanguageBytes> {
        Ok(self.languages.clone())
    }

    async fn contributors(&self, _repo: &RepoRef) -> Result<Vec<Contributor>> {
        Ok(self.contributors.clone())
    }

    async fn commits_since(
        &self,
        _repo: &RepoRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitSummary>> {
        Ok(self
            .commits
            .iter()
            .filter(|commit| commit.authored_at >= since)
            .cloned()
            .collect())
    }

    async fn list_directory(&self, _repo: &RepoRef, path: &str) -> Result<Vec<DirectoryEntry>> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };
        Ok(self
            .entries()
            .into_iter()
            .filter(|entry| {
                entry
                    .path
                    .strip_prefix(&prefix)
                    .map(|rest| !rest.is_empty() && !rest.contains('/'))
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn list_tree(&self, _repo: &RepoRef, _branch: &str) -> Result<Vec<DirectoryEntry>> {
        if self.tree_fails {
            return Err(InsightError::Other("tree listing unavailable".to_string()));
        }
        Ok(self.entries())
    }

    async fn path_exists(&self, _repo: &RepoRef, path: &str) -> Result<bool> {
        Ok(self.files.contains_key(path) || self.dirs.contains(path))
    }

    async fn read_file(&self, _repo: &RepoRef, path: &str) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| InsightError::NotFound(path.to_string()))
    }
}
