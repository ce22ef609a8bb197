//! Code-metrics estimation from a language-byte histogram.
//!
//! Nothing here reads source files. Line counts assume a fixed average of
//! [`BYTES_PER_LINE`] bytes per line, complexity is a step function of the
//! line estimate, and test coverage is a random draw from a range chosen by
//! test-like names in the top-level listing. Treat every number as a rough
//! heuristic.

use rand::Rng;

use crate::domain::{
    CodeMetrics, DirectoryEntry, EntryKind, FileTypeStat, LanguageBytes, MetricsEstimate,
};
use crate::error::{InsightError, Result};

/// Assumed average bytes per line of code.
pub const BYTES_PER_LINE: f64 = 50.0;

/// Assumed average lines per file when no tree listing is available.
pub const LINES_PER_FILE: f64 = 100.0;

/// Test-related names found in a top-level listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoverageSignals {
    /// A directory whose name contains `test` or `spec`.
    pub test_dirs: bool,
    /// An entry whose name contains `.test.` or `.spec.`.
    pub test_files: bool,
}

impl CoverageSignals {
    /// Scan a listing for test-related names, case-insensitively.
    pub fn from_listing(listing: &[DirectoryEntry]) -> Self {
        let mut signals = Self::default();
        for entry in listing {
            let name = entry.name.to_lowercase();
            if entry.kind == EntryKind::Dir && (name.contains("test") || name.contains("spec")) {
                signals.test_dirs = true;
            }
            if name.contains(".test.") || name.contains(".spec.") {
                signals.test_files = true;
            }
        }
        signals
    }

    fn coverage_range(&self) -> std::ops::Range<u8> {
        match (self.test_dirs, self.test_files) {
            (true, true) => 70..100,
            (true, false) | (false, true) => 40..80,
            (false, false) => 20..50,
        }
    }
}

/// Estimate metrics for a repository.
///
/// `tree` is the recursive listing used for an exact file count; pass `None`
/// when it could not be fetched to fall back to `lines / 100`.
pub fn estimate_metrics<R: Rng + ?Sized>(
    languages: &LanguageBytes,
    listing: &[DirectoryEntry],
    tree: Option<&[DirectoryEntry]>,
    rng: &mut R,
) -> Result<MetricsEstimate> {
    let total_bytes: u64 = languages.values().sum();
    if total_bytes == 0 {
        return Err(InsightError::EmptyHistogram);
    }
    let total_lines = estimate_lines(total_bytes);
    let total_files = match tree {
        Some(entries) => entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .count() as u64,
        None => (total_lines as f64 / LINES_PER_FILE).round() as u64,
    };

    let mut file_types: Vec<FileTypeStat> = languages
        .iter()
        .map(|(language, bytes)| {
            let share = *bytes as f64 / total_bytes as f64;
            FileTypeStat {
                name: language.clone(),
                files: (total_files as f64 * share).round() as u64,
                lines: (total_lines as f64 * share).round() as u64,
            }
        })
        .collect();
    file_types.sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.name.cmp(&b.name)));

    Ok(MetricsEstimate {
        metrics: CodeMetrics {
            total_lines,
            total_files,
            avg_complexity: complexity_for_lines(total_lines),
            test_coverage: estimate_test_coverage(listing, rng),
        },
        file_types,
    })
}

/// Estimated line count for a byte total.
pub fn estimate_lines(total_bytes: u64) -> u64 {
    (total_bytes as f64 / BYTES_PER_LINE).round() as u64
}

/// Complexity anchor for a line estimate; the anchors have no statistical basis.
pub fn complexity_for_lines(lines: u64) -> f64 {
    if lines >= 100_000 {
        8.5
    } else if lines >= 50_000 {
        6.2
    } else if lines >= 10_000 {
        4.8
    } else {
        3.2
    }
}

/// Draw a coverage percentage from the range picked by the listing's signals.
pub fn estimate_test_coverage<R: Rng + ?Sized>(listing: &[DirectoryEntry], rng: &mut R) -> u8 {
    rng.gen_range(CoverageSignals::from_listing(listing).coverage_range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn histogram(entries: &[(&str, u64)]) -> LanguageBytes {
        entries
            .iter()
            .map(|(name, bytes)| (name.to_string(), *bytes))
            .collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn typescript_scenario_matches_expected_estimates() {
        let estimate =
            estimate_metrics(&histogram(&[("TypeScript", 500_000)]), &[], None, &mut rng())
                .expect("estimate");

        assert_eq!(estimate.metrics.total_lines, 10_000);
        assert_eq!(estimate.metrics.total_files, 100);
        assert_eq!(estimate.metrics.avg_complexity, 4.8);
        assert_eq!(
            estimate.file_types,
            vec![FileTypeStat {
                name: "TypeScript".to_string(),
                files: 100,
                lines: 10_000,
            }]
        );
    }

    #[test]
    fn empty_histogram_is_an_error() {
        let err = estimate_metrics(&LanguageBytes::new(), &[], None, &mut rng()).unwrap_err();
        assert!(matches!(err, InsightError::EmptyHistogram));

        let zero = histogram(&[("Rust", 0)]);
        assert!(estimate_metrics(&zero, &[], None, &mut rng()).is_err());
    }

    #[test]
    fn tree_listing_counts_only_files() {
        let tree = vec![
            DirectoryEntry::new("src", EntryKind::Dir),
            DirectoryEntry::new("src/main.rs", EntryKind::File),
            DirectoryEntry::new("src/lib.rs", EntryKind::File),
            DirectoryEntry::new("vendor", EntryKind::Submodule),
        ];
        let estimate =
            estimate_metrics(&histogram(&[("Rust", 5_000)]), &[], Some(&tree), &mut rng())
                .expect("estimate");

        assert_eq!(estimate.metrics.total_files, 2);
    }

    #[test]
    fn language_lines_sum_to_total_within_rounding() {
        let languages = histogram(&[
            ("TypeScript", 123_457),
            ("CSS", 9_877),
            ("HTML", 3_331),
            ("Shell", 71),
        ]);
        let estimate = estimate_metrics(&languages, &[], None, &mut rng()).expect("estimate");

        let sum: u64 = estimate.file_types.iter().map(|stat| stat.lines).sum();
        let total = estimate.metrics.total_lines;
        assert!(sum.abs_diff(total) <= languages.len() as u64);
        assert_eq!(estimate.file_types[0].name, "TypeScript");
        assert_eq!(estimate.file_types.last().unwrap().name, "Shell");
    }

    #[test]
    fn complexity_steps_at_anchors() {
        assert_eq!(complexity_for_lines(0), 3.2);
        assert_eq!(complexity_for_lines(9_999), 3.2);
        assert_eq!(complexity_for_lines(10_000), 4.8);
        assert_eq!(complexity_for_lines(50_000), 6.2);
        assert_eq!(complexity_for_lines(250_000), 8.5);
    }

    #[test]
    fn coverage_ranges_follow_signals() {
        let both = vec![
            DirectoryEntry::new("Tests", EntryKind::Dir),
            DirectoryEntry::new("app.spec.ts", EntryKind::File),
        ];
        let dir_only = vec![DirectoryEntry::new("__tests__", EntryKind::Dir)];
        let file_only = vec![DirectoryEntry::new("index.test.js", EntryKind::File)];
        let neither = vec![
            DirectoryEntry::new("src", EntryKind::Dir),
            DirectoryEntry::new("testing.md", EntryKind::File),
        ];

        let mut rng = rng();
        for _ in 0..200 {
            assert!((70..100).contains(&estimate_test_coverage(&both, &mut rng)));
            assert!((40..80).contains(&estimate_test_coverage(&dir_only, &mut rng)));
            assert!((40..80).contains(&estimate_test_coverage(&file_only, &mut rng)));
            assert!((20..50).contains(&estimate_test_coverage(&neither, &mut rng)));
        }
    }

    #[test]
    fn seeded_coverage_is_reproducible() {
        let listing = vec![DirectoryEntry::new("spec", EntryKind::Dir)];
        let first = estimate_test_coverage(&listing, &mut StdRng::seed_from_u64(42));
        let second = estimate_test_coverage(&listing, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }
}
