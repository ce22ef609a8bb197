//! GitHub REST implementation of [`RepositorySource`].

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{
    CommitSummary, Contributor, DirectoryEntry, EntryKind, LanguageBytes, RepoRef,
    RepositoryRecord,
};
use crate::error::{InsightError, Result};
use crate::source::RepositorySource;

/// Default public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PAGE_SIZE: &str = "100";

/// Upper bound on commit pages followed per request.
const MAX_COMMIT_PAGES: usize = 50;

/// Connection settings for the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    /// API base URL.
    pub api_url: String,
    /// Optional bearer token.
    pub token: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: "repoinsight".to_string(),
        }
    }
}

impl GitHubConfig {
    /// Build settings from `GITHUB_API_URL`, `GITHUB_TOKEN` and `GITHUB_USER_AGENT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values fall back to the defaults.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_url: value("GITHUB_API_URL").unwrap_or(defaults.api_url),
            token: value("GITHUB_TOKEN"),
            user_agent: value("GITHUB_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

/// GitHub API client.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubSource {
    /// Create a client from explicit settings.
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| InsightError::Other("invalid GitHub user agent".to_string()))?,
        );
        if let Some(token) = &config.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| InsightError::Other("invalid GitHub token".to_string()))?,
            );
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GitHubConfig::from_env())
    }

    /// API base URL without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn repo_url(&self, repo: &RepoRef, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{suffix}",
            self.api_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        )
    }

    fn contents_url(&self, repo: &RepoRef, path: &str) -> String {
        let encoded = path
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if encoded.is_empty() {
            self.repo_url(repo, "/contents")
        } else {
            self.repo_url(repo, &format!("/contents/{encoded}"))
        }
    }

    async fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        debug!("GET {url}");
        Ok(self.client.get(url).query(query).send().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.send(url, query).await?;
        decode_json(url, response).await
    }
}

async fn decode_json<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(InsightError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        return Err(InsightError::Api {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|err| InsightError::Decode(format!("{url}: {err}")))
}

#[async_trait]
impl RepositorySource for GitHubSource {
    async fn repository(&self, repo: &RepoRef) -> Result<RepositoryRecord> {
        let payload: GitHubRepository = self.get_json(&self.repo_url(repo, ""), &[]).await?;
        Ok(payload.into_record())
    }

    async fn languages(&self, repo: &RepoRef) -> Result<LanguageBytes> {
        self.get_json(&self.repo_url(repo, "/languages"), &[]).await
    }

    async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>> {
        let url = self.repo_url(repo, "/contributors");
        let response = self.send(&url, &[("per_page", PAGE_SIZE)]).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let payload: Vec<GitHubContributor> = decode_json(&url, response).await?;
        Ok(payload
            .into_iter()
            .map(|contributor| Contributor {
                login: contributor.login,
                contributions: contributor.contributions,
                avatar_url: contributor.avatar_url,
            })
            .collect())
    }

    async fn commits_since(
        &self,
        repo: &RepoRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitSummary>> {
        let mut url = self.repo_url(repo, "/commits");
        let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut response = self
            .send(&url, &[("since", since.as_str()), ("per_page", PAGE_SIZE)])
            .await?;
        // An empty repository answers 409 Conflict.
        if response.status() == StatusCode::CONFLICT {
            return Ok(Vec::new());
        }

        let mut commits = Vec::new();
        for page in 1..=MAX_COMMIT_PAGES {
            let next = next_page_url(response.headers());
            let payload: Vec<GitHubCommit> = decode_json(&url, response).await?;
            if payload.is_empty() {
                break;
            }
            commits.extend(payload.into_iter().filter_map(GitHubCommit::into_summary));
            let Some(next) = next else {
                break;
            };
            if page == MAX_COMMIT_PAGES {
                warn!(
                    "commit history for {repo} exceeds {MAX_COMMIT_PAGES} pages; older commits are skipped"
                );
                break;
            }
            // Link targets already carry the query string.
            response = self.send(&next, &[]).await?;
            url = next;
        }
        Ok(commits)
    }

    async fn list_directory(&self, repo: &RepoRef, path: &str) -> Result<Vec<DirectoryEntry>> {
        let url = self.contents_url(repo, path);
        match self.get_json::<GitHubContents>(&url, &[]).await? {
            GitHubContents::Listing(items) => Ok(items
                .into_iter()
                .map(|item| DirectoryEntry {
                    kind: contents_kind(&item.kind),
                    name: item.name,
                    path: item.path,
                })
                .collect()),
            GitHubContents::Item(_) => Err(InsightError::Decode(format!("{url}: not a directory"))),
        }
    }

    async fn list_tree(&self, repo: &RepoRef, branch: &str) -> Result<Vec<DirectoryEntry>> {
        let url = self.repo_url(
            repo,
            &format!("/git/trees/{}", urlencoding::encode(branch)),
        );
        let payload: GitHubTree = self.get_json(&url, &[("recursive", "1")]).await?;
        if payload.truncated {
            warn!("tree listing for {repo} was truncated; file count is a lower bound");
        }
        Ok(payload
            .tree
            .into_iter()
            .map(|entry| DirectoryEntry::new(entry.path, tree_kind(&entry.kind)))
            .collect())
    }

    async fn path_exists(&self, repo: &RepoRef, path: &str) -> Result<bool> {
        let url = self.contents_url(repo, path);
        let response = self.send(&url, &[]).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(InsightError::Api {
                status: status.as_u16(),
                url,
            });
        }
        Ok(true)
    }

    async fn read_file(&self, repo: &RepoRef, path: &str) -> Result<String> {
        let url = self.contents_url(repo, path);
        let item = match self.get_json::<GitHubContents>(&url, &[]).await? {
            GitHubContents::Item(item) => item,
            GitHubContents::Listing(_) => {
                return Err(InsightError::Decode(format!("{url}: is a directory")));
            }
        };
        let content = item
            .content
            .ok_or_else(|| InsightError::Decode(format!("{url}: missing content")))?;
        if item.encoding.as_deref().unwrap_or("base64") != "base64" {
            return Err(InsightError::Decode(format!("{url}: unsupported encoding")));
        }
        let compact: String = content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|err| InsightError::Decode(format!("{url}: {err}")))?;
        String::from_utf8(bytes).map_err(|err| InsightError::Decode(format!("{url}: {err}")))
    }
}

/// Target of the `rel="next"` entry in a `Link` header.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#);
        is_next.then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

fn contents_kind(kind: &str) -> EntryKind {
    match kind {
        "dir" => EntryKind::Dir,
        "symlink" => EntryKind::Symlink,
        "submodule" => EntryKind::Submodule,
        _ => EntryKind::File,
    }
}

fn tree_kind(kind: &str) -> EntryKind {
    match kind {
        "tree" => EntryKind::Dir,
        "commit" => EntryKind::Submodule,
        _ => EntryKind::File,
    }
}

#[derive(Debug, Deserialize)]
struct GitHubOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubLicense {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    owner: GitHubOwner,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    watchers_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    private: bool,
    license: Option<GitHubLicense>,
    #[serde(default)]
    has_issues: bool,
    #[serde(default)]
    has_wiki: bool,
    #[serde(default)]
    has_pages: bool,
    #[serde(default)]
    has_projects: bool,
    homepage: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    default_branch: String,
}

impl GitHubRepository {
    fn into_record(self) -> RepositoryRecord {
        RepositoryRecord {
            owner: self.owner.login,
            name: self.name,
            description: self.description,
            language: self.language,
            stars: self.stargazers_count,
            forks: self.forks_count,
            watchers: self.watchers_count,
            open_issues: self.open_issues_count,
            private: self.private,
            license: self.license.map(|license| license.name),
            has_issues: self.has_issues,
            has_wiki: self.has_wiki,
            has_pages: self.has_pages,
            has_projects: self.has_projects,
            homepage: self.homepage,
            created_at: self.created_at,
            updated_at: self.updated_at,
            default_branch: self.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubContributor {
    login: String,
    #[serde(default)]
    contributions: u64,
    #[serde(default)]
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitPerson {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitDetail {
    author: Option<GitHubCommitPerson>,
    committer: Option<GitHubCommitPerson>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    sha: String,
    commit: GitHubCommitDetail,
}

impl GitHubCommit {
    fn into_summary(self) -> Option<CommitSummary> {
        let authored_at = self.commit.author.or(self.commit.committer)?.date;
        Some(CommitSummary {
            sha: self.sha,
            authored_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GitHubContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitHubContents {
    Listing(Vec<GitHubContentItem>),
    Item(GitHubContentItem),
}

#[derive(Debug, Deserialize)]
struct GitHubTreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct GitHubTree {
    tree: Vec<GitHubTreeEntry>,
    #[serde(default)]
    truncated: bool,
}
