#![deny(missing_docs)]
//! RepoInsight command-line interface.
//!
//! Analyzes one repository or a file of repositories against the GitHub API
//! and renders the results as text, JSON or Markdown.

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use repoinsight_core::github::DEFAULT_API_URL;
use repoinsight_core::{
    AnalysisStatus, Analyzer, AnalyzerOptions, GitHubConfig, GitHubSource, RepoRef, RepoReport,
    format_file_types, render_json, render_markdown,
};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "repoinsight", version, about = "RepoInsight CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(&["file", "repo"])
))]
struct RepoSourceArgs {
    /// File containing repositories (one per line).
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Single repository as `owner/name` or a GitHub URL.
    #[arg(long)]
    repo: Option<String>,
}

#[derive(Args, Clone)]
struct GitHubArgs {
    /// GitHub token used for API requests.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// GitHub API base URL.
    #[arg(long = "api-url", env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// User-Agent sent to the GitHub API.
    #[arg(long = "user-agent", env = "GITHUB_USER_AGENT", default_value = "repoinsight")]
    user_agent: String,
}

#[derive(Args, Clone)]
struct AnalyzeArgs {
    /// Maximum number of concurrent analyses.
    #[arg(short = 'j', long, default_value_t = 5)]
    concurrency: usize,
    /// Seed for the coverage estimate.
    #[arg(long, env = "REPOINSIGHT_COVERAGE_SEED")]
    seed: Option<u64>,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze repositories from a single reference or a file.
    Analyze {
        #[command(flatten)]
        source: RepoSourceArgs,
        #[command(flatten)]
        github: GitHubArgs,
        #[command(flatten)]
        analyze: AnalyzeArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BatchSource {
    File(PathBuf),
    Repo(String),
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            github,
            analyze,
            report,
        } => {
            let source = resolve_source_args(&source)?;
            let analyzer = build_analyzer(&github, analyze.seed)?;
            run_analyze(source, analyzer, analyze.concurrency, report).await?
        }
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

fn build_analyzer(github: &GitHubArgs, seed: Option<u64>) -> CliResult<Analyzer> {
    let source = GitHubSource::new(GitHubConfig {
        api_url: github.api_url.clone(),
        token: github
            .token
            .clone()
            .filter(|token| !token.trim().is_empty()),
        user_agent: github.user_agent.clone(),
    })?;
    let options = AnalyzerOptions {
        coverage_seed: seed,
        ..AnalyzerOptions::default()
    };
    Ok(Analyzer::with_options(Arc::new(source), options))
}

async fn run_analyze(
    source: BatchSource,
    analyzer: Analyzer,
    concurrency: usize,
    report: OutputArgs,
) -> CliResult<()> {
    let inputs = load_repo_inputs(source).await?;
    if inputs.is_empty() {
        warn!("no repositories found to analyze");
    }

    info!("analyzing {} repositories", inputs.len());
    let concurrency = if concurrency == 0 { 1 } else { concurrency };
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for (index, input) in inputs.into_iter().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let analyzer = analyzer.clone();
        tasks.spawn(async move {
            let _permit = permit;
            (index, analyze_target(&analyzer, input).await)
        });
    }

    let mut reports = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(entry) => reports.push(entry),
            Err(err) => reports.push((usize::MAX, report_from_task_error(err))),
        }
    }
    reports.sort_by_key(|(index, _)| *index);
    let reports: Vec<RepoReport> = reports.into_iter().map(|(_, report)| report).collect();

    emit_reports(&reports, &report).await?;

    Ok(())
}

fn resolve_source_args(source: &RepoSourceArgs) -> CliResult<BatchSource> {
    if let Some(file) = &source.file {
        return Ok(BatchSource::File(file.clone()));
    }
    if let Some(repo) = &source.repo {
        let trimmed = repo.trim();
        if trimmed.is_empty() {
            return Err("repository reference cannot be empty".into());
        }
        return Ok(BatchSource::Repo(trimmed.to_string()));
    }
    Err("no repository source provided".into())
}

async fn load_repo_inputs(source: BatchSource) -> CliResult<Vec<String>> {
    match source {
        BatchSource::File(path) => load_repo_lines(&path).await,
        BatchSource::Repo(repo) => Ok(vec![repo]),
    }
}

async fn load_repo_lines(path: &Path) -> CliResult<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let lines = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    Ok(lines)
}

async fn analyze_target(analyzer: &Analyzer, input: String) -> RepoReport {
    let repo = match input.parse::<RepoRef>() {
        Ok(repo) => repo,
        Err(err) => {
            warn!("skipping {input}: {err}");
            return RepoReport::failed(input, err.to_string());
        }
    };
    match analyzer.analyze(&repo).await {
        Ok(analysis) => RepoReport::completed(input, analysis),
        Err(err) => {
            warn!("analysis of {repo} failed: {err}");
            RepoReport::failed(input, err.to_string())
        }
    }
}

fn report_from_task_error(error: tokio::task::JoinError) -> RepoReport {
    RepoReport::failed("unknown", error.to_string())
}

async fn emit_reports(reports: &[RepoReport], output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_analysis_text(reports),
        OutputFormat::Markdown => render_markdown(reports),
        OutputFormat::Json => render_json(reports)?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn render_analysis_text(reports: &[RepoReport]) -> String {
    let mut output = String::new();
    for report in reports {
        let _ = writeln!(output, "Source: {}", report.source);
        match &report.status {
            AnalysisStatus::Completed => {
                let _ = writeln!(output, "Status: completed");
            }
            AnalysisStatus::Failed(error) => {
                let _ = writeln!(output, "Status: failed ({error})");
                let _ = writeln!(output);
                continue;
            }
        }

        let Some(analysis) = &report.analysis else {
            let _ = writeln!(output);
            continue;
        };
        let metrics = &analysis.code_metrics;
        let scores = &analysis.scores;
        let _ = writeln!(output, "Repository: {}", analysis.repository);
        let _ = writeln!(
            output,
            "Lines (estimated): {}  Files: {}  Complexity: {:.1}  Coverage (heuristic): {}%",
            metrics.total_lines, metrics.total_files, metrics.avg_complexity, metrics.test_coverage
        );
        let _ = writeln!(
            output,
            "Scores: security {} / maintainability {} / documentation {}",
            scores.security_score, scores.maintainability_score, scores.documentation_score
        );
        let recent: u32 = analysis.commits.iter().map(|day| day.count).sum();
        let _ = writeln!(output, "Commits (30 days): {recent}");

        if analysis.file_types.is_empty() {
            let _ = writeln!(output, "Languages: none detected");
        } else {
            let _ = writeln!(output, "Languages:");
            for (language, percent) in format_file_types(&analysis.file_types) {
                let _ = writeln!(output, "- {language}: {percent:.2}%");
            }
        }

        if analysis.tech_stack.is_empty() {
            let _ = writeln!(output, "Tech stack: none detected");
        } else {
            let names: Vec<&str> = analysis
                .tech_stack
                .iter()
                .map(|tech| tech.name.as_str())
                .collect();
            let _ = writeln!(output, "Tech stack: {}", names.join(", "));
        }

        if analysis.vulnerabilities.is_empty() {
            let _ = writeln!(output, "Findings: none");
        } else {
            let _ = writeln!(output, "Findings:");
            for finding in &analysis.vulnerabilities {
                let _ = writeln!(
                    output,
                    "- [{}] {}: {}",
                    finding.severity.as_str(),
                    finding.title,
                    finding.description
                );
            }
        }

        let _ = writeln!(output);
    }
    output
}
