//! Report formatting for analysis runs.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::domain::{AnalysisResult, DetectedTechnology, FileTypeStat, VulnerabilityFinding};

/// Outcome of analyzing one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Analysis finished.
    Completed,
    /// Analysis failed with an error message.
    Failed(String),
}

/// Analysis report for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoReport {
    /// Repository reference as given.
    pub source: String,
    /// Analysis status.
    pub status: AnalysisStatus,
    /// Analysis output, once completed.
    pub analysis: Option<AnalysisResult>,
}

impl RepoReport {
    /// Create a report for a finished analysis.
    pub fn completed(source: impl Into<String>, analysis: AnalysisResult) -> Self {
        Self {
            source: source.into(),
            status: AnalysisStatus::Completed,
            analysis: Some(analysis),
        }
    }

    /// Create a report for a failed analysis.
    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            status: AnalysisStatus::Failed(error.into()),
            analysis: None,
        }
    }
}

/// Render a list of analysis reports as Markdown.
pub fn render_markdown(reports: &[RepoReport]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# RepoInsight Analysis Report\n");
    for report in reports {
        let _ = writeln!(output, "## {}\n", report.source);
        append_status(&mut output, &report.status);
        if let Some(analysis) = &report.analysis {
            append_overview(&mut output, analysis);
            append_file_types(&mut output, &analysis.file_types);
            append_tech_stack(&mut output, &analysis.tech_stack);
            append_findings(&mut output, &analysis.vulnerabilities);
        }
        let _ = writeln!(output);
    }
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// Per-language share of estimated lines, largest first.
pub fn format_file_types(file_types: &[FileTypeStat]) -> Vec<(String, f64)> {
    let total: u64 = file_types.iter().map(|stat| stat.lines).sum();
    let mut items: Vec<(String, f64)> = file_types
        .iter()
        .map(|stat| {
            let percent = if total == 0 {
                0.0
            } else {
                stat.lines as f64 * 100.0 / total as f64
            };
            (stat.name.clone(), percent)
        })
        .collect();
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    items
}

fn append_status(output: &mut String, status: &AnalysisStatus) {
    match status {
        AnalysisStatus::Completed => {
            let _ = writeln!(output, "- Status: completed");
        }
        AnalysisStatus::Failed(error) => {
            let _ = writeln!(output, "- Status: failed ({error})");
        }
    }
    let _ = writeln!(output);
}

fn append_overview(output: &mut String, analysis: &AnalysisResult) {
    let metrics = &analysis.code_metrics;
    let scores = &analysis.scores;
    let recent: u32 = analysis.commits.iter().map(|day| day.count).sum();
    let _ = writeln!(output, "### Overview");
    let _ = writeln!(output, "- Analyzed at: {}", analysis.analyzed_at.to_rfc3339());
    let _ = writeln!(output, "- Estimated lines: {}", metrics.total_lines);
    let _ = writeln!(output, "- Files: {}", metrics.total_files);
    let _ = writeln!(output, "- Complexity: {:.1}", metrics.avg_complexity);
    let _ = writeln!(output, "- Test coverage (heuristic): {}%", metrics.test_coverage);
    let _ = writeln!(
        output,
        "- Scores: security {}, maintainability {}, documentation {}",
        scores.security_score, scores.maintainability_score, scores.documentation_score
    );
    let _ = writeln!(output, "- Commits in the last 30 days: {recent}");
    let _ = writeln!(output, "- Contributors shown: {}", analysis.contributors.len());
    let _ = writeln!(output);
}

fn append_file_types(output: &mut String, file_types: &[FileTypeStat]) {
    if file_types.is_empty() {
        let _ = writeln!(output, "### Languages\nNo languages detected.\n");
        return;
    }
    let _ = writeln!(output, "### Languages");
    for (language, percent) in format_file_types(file_types) {
        let _ = writeln!(output, "- {language}: {percent:.2}%");
    }
    let _ = writeln!(output);
}

fn append_tech_stack(output: &mut String, tech_stack: &[DetectedTechnology]) {
    if tech_stack.is_empty() {
        let _ = writeln!(output, "### Tech stack\nNo technologies detected.\n");
        return;
    }
    let _ = writeln!(output, "### Tech stack");
    for tech in tech_stack {
        match &tech.version {
            Some(version) => {
                let _ = writeln!(output, "- {} {version} ({})", tech.name, tech.category);
            }
            None => {
                let _ = writeln!(output, "- {} ({})", tech.name, tech.category);
            }
        }
    }
    let _ = writeln!(output);
}

fn append_findings(output: &mut String, findings: &[VulnerabilityFinding]) {
    if findings.is_empty() {
        let _ = writeln!(output, "### Findings\nNo findings.\n");
        return;
    }
    let _ = writeln!(output, "### Findings");
    for finding in findings {
        let _ = writeln!(
            output,
            "- [{}] {}: {}",
            finding.severity.as_str(),
            finding.title,
            finding.description
        );
    }
    let _ = writeln!(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CodeMetrics, Confidence, ScoreTriple, Severity, TechCategory};
    use crate::testing::fixed_now;

    fn sample_analysis() -> AnalysisResult {
        AnalysisResult {
            repository: "octo/demo".to_string(),
            analyzed_at: fixed_now(),
            code_metrics: CodeMetrics {
                total_lines: 10_000,
                total_files: 100,
                avg_complexity: 4.8,
                test_coverage: 33,
            },
            scores: ScoreTriple {
                security_score: 70,
                maintainability_score: 65,
                documentation_score: 55,
            },
            commits: Vec::new(),
            contributors: Vec::new(),
            file_types: vec![
                FileTypeStat {
                    name: "CSS".to_string(),
                    files: 10,
                    lines: 2_500,
                },
                FileTypeStat {
                    name: "TypeScript".to_string(),
                    files: 90,
                    lines: 7_500,
                },
            ],
            vulnerabilities: vec![VulnerabilityFinding {
                severity: Severity::Medium,
                title: "Outdated Dependencies".to_string(),
                description: "React ^16.8.0".to_string(),
            }],
            tech_stack: vec![DetectedTechnology {
                name: "React".to_string(),
                category: TechCategory::Framework,
                confidence: Confidence::High,
                version: Some("^16.8.0".to_string()),
                icon: Some("react".to_string()),
            }],
        }
    }

    #[test]
    fn renders_completed_markdown() {
        let report = RepoReport::completed("octo/demo", sample_analysis());
        let output = render_markdown(&[report]);
        assert!(output.contains("RepoInsight Analysis Report"));
        assert!(output.contains("## octo/demo"));
        assert!(output.contains("Status: completed"));
        assert!(output.contains("Estimated lines: 10000"));
        assert!(output.contains("TypeScript: 75.00%"));
        assert!(output.contains("React ^16.8.0 (Framework)"));
        assert!(output.contains("[medium] Outdated Dependencies"));
    }

    #[test]
    fn renders_failed_markdown_without_sections() {
        let report = RepoReport::failed("octo/missing", "not found: octo/missing");
        let output = render_markdown(&[report]);
        assert!(output.contains("Status: failed (not found: octo/missing)"));
        assert!(!output.contains("### Overview"));
    }

    #[test]
    fn renders_json_payload() {
        let reports = vec![
            RepoReport::completed("octo/demo", sample_analysis()),
            RepoReport::failed("octo/missing", "boom"),
        ];
        let json = render_json(&reports).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed[0]["status"]["status"], "completed");
        assert_eq!(parsed[0]["analysis"]["securityScore"], 70);
        assert_eq!(parsed[1]["status"]["message"], "boom");
        assert!(parsed[1]["analysis"].is_null());
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn formats_file_types_sorted_by_share() {
        let ordered = format_file_types(&sample_analysis().file_types);
        assert_eq!(ordered[0].0, "TypeScript");
        assert_eq!(ordered[0].1, 75.0);
        assert_eq!(ordered[1].1, 25.0);
    }

    #[test]
    fn formats_empty_file_types() {
        let zero = vec![FileTypeStat {
            name: "Shell".to_string(),
            files: 0,
            lines: 0,
        }];
        assert_eq!(format_file_types(&zero), vec![("Shell".to_string(), 0.0)]);
    }
}
