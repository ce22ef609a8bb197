//! Heuristic quality scores.
//!
//! Each score starts at a fixed base, adds fixed bonuses for satisfied
//! conditions and is clamped to `0..=100`. The scores are explainable
//! proxies, not static analysis.

use crate::domain::{RepositoryRecord, ScoreTriple};

/// Compute all three scores.
///
/// `recent_commits` counts commits from the last year and `contributors`
/// counts the full contributor list.
pub fn compute_scores(
    record: &RepositoryRecord,
    recent_commits: usize,
    contributors: usize,
) -> ScoreTriple {
    ScoreTriple {
        security_score: security_score(record, recent_commits),
        maintainability_score: maintainability_score(record, recent_commits, contributors),
        documentation_score: documentation_score(record),
    }
}

/// Security score, base 70.
pub fn security_score(record: &RepositoryRecord, recent_commits: usize) -> u8 {
    let mut score: i32 = 70;
    if record.private {
        score += 10;
    }
    if record.has_issues {
        score += 5;
    }
    if record.has_wiki {
        score += 5;
    }
    if record.license.is_some() {
        score += 10;
    }
    if recent_commits > 50 {
        score += 10;
    } else if recent_commits > 20 {
        score += 5;
    }
    clamp_score(score)
}

/// Maintainability score, base 65.
pub fn maintainability_score(
    record: &RepositoryRecord,
    recent_commits: usize,
    contributors: usize,
) -> u8 {
    let mut score: i32 = 65;
    if record.has_description() {
        score += 5;
    }
    if record.has_wiki {
        score += 10;
    }
    score += match recent_commits {
        count if count > 30 => 15,
        count if count > 10 => 10,
        count if count > 5 => 5,
        _ => 0,
    };
    score += match contributors {
        count if count > 10 => 10,
        count if count > 5 => 5,
        _ => 0,
    };
    clamp_score(score)
}

/// Documentation score, base 40.
pub fn documentation_score(record: &RepositoryRecord) -> u8 {
    let mut score: i32 = 40;
    if record.has_description() {
        score += 15;
    }
    if record.has_wiki {
        score += 20;
    }
    if record.has_homepage() {
        score += 10;
    }
    // Stand-in for a README probe; applied to every repository.
    score += 15;
    clamp_score(score)
}

fn clamp_score(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}
