//! Heuristic findings; this is not a CVE or advisory scan.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{DetectedTechnology, RepositoryRecord, Severity, VulnerabilityFinding};

/// Repositories not updated for longer than this are flagged (182.5 days).
pub const STALE_AFTER_SECONDS: i64 = 15_768_000;

/// Lowest caret major version considered current, keyed by a name substring.
const FRAMEWORK_FLOORS: &[(&str, u32)] = &[("react", 17), ("vue", 3), ("angular", 15), ("next", 13)];

/// Evaluate every finding rule independently.
pub fn assess_vulnerabilities(
    record: &RepositoryRecord,
    tech_stack: &[DetectedTechnology],
    now: DateTime<Utc>,
) -> Vec<VulnerabilityFinding> {
    let mut findings = Vec::new();

    let outdated: Vec<&DetectedTechnology> =
        tech_stack.iter().filter(|tech| is_outdated(tech)).collect();
    if !outdated.is_empty() {
        let listed = outdated
            .iter()
            .map(|tech| format!("{} {}", tech.name, tech.version.as_deref().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(", ");
        findings.push(VulnerabilityFinding {
            severity: Severity::Medium,
            title: "Outdated Dependencies".to_string(),
            description: format!("Frameworks pinned to old major versions: {listed}"),
        });
    }

    if now - record.updated_at > Duration::seconds(STALE_AFTER_SECONDS) {
        findings.push(VulnerabilityFinding {
            severity: Severity::Low,
            title: "Infrequent Updates".to_string(),
            description: format!(
                "Repository has not been updated since {}",
                record.updated_at.format("%Y-%m-%d")
            ),
        });
    }

    if record.license.is_none() {
        findings.push(VulnerabilityFinding {
            severity: Severity::Low,
            title: "Missing License".to_string(),
            description: "No license is recorded for this repository".to_string(),
        });
    }

    findings
}

fn is_outdated(tech: &DetectedTechnology) -> bool {
    let name = tech.name.to_lowercase();
    let Some((_, floor)) = FRAMEWORK_FLOORS.iter().find(|(key, _)| name.contains(key)) else {
        return false;
    };
    tech.version
        .as_deref()
        .and_then(caret_major)
        .map(|major| major < *floor)
        .unwrap_or(false)
}

fn caret_major(version: &str) -> Option<u32> {
    version.strip_prefix('^')?.split('.').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Confidence, TechCategory};
    use crate::testing::{fixed_now, record};

    fn tech(name: &str, version: Option<&str>) -> DetectedTechnology {
        DetectedTechnology {
            name: name.to_string(),
            category: TechCategory::Framework,
            confidence: Confidence::High,
            version: version.map(str::to_string),
            icon: None,
        }
    }

    fn titles(findings: &[VulnerabilityFinding]) -> Vec<&str> {
        findings.iter().map(|finding| finding.title.as_str()).collect()
    }

    fn licensed() -> RepositoryRecord {
        let mut record = record();
        record.license = Some("MIT License".to_string());
        record
    }

    #[test]
    fn old_react_caret_version_is_outdated() {
        let findings =
            assess_vulnerabilities(&licensed(), &[tech("React", Some("^16.8.0"))], fixed_now());

        assert_eq!(titles(&findings), vec!["Outdated Dependencies"]);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert!(findings[0].description.contains("React ^16.8.0"));
    }

    #[test]
    fn current_or_uncareted_versions_are_not_flagged() {
        let stack = [
            tech("React", Some("^18.2.0")),
            tech("Vue.js", Some("2.6.0")),
            tech("Angular", Some("~12.0.0")),
            tech("Next.js", None),
            tech("Express", Some("^3.0.0")),
        ];
        assert!(assess_vulnerabilities(&licensed(), &stack, fixed_now()).is_empty());
    }

    #[test]
    fn one_finding_lists_every_outdated_framework() {
        let stack = [tech("Vue.js", Some("^2.7.14")), tech("Next.js", Some("^12.3.0"))];
        let findings = assess_vulnerabilities(&licensed(), &stack, fixed_now());

        assert_eq!(findings.len(), 1);
        assert!(findings[0].description.contains("Vue.js"));
        assert!(findings[0].description.contains("Next.js"));
    }

    #[test]
    fn stale_repository_is_flagged_after_half_a_year() {
        let mut record = licensed();
        record.updated_at = fixed_now() - Duration::days(183);
        assert_eq!(
            titles(&assess_vulnerabilities(&record, &[], fixed_now())),
            vec!["Infrequent Updates"]
        );

        record.updated_at = fixed_now() - Duration::days(182);
        assert!(assess_vulnerabilities(&record, &[], fixed_now()).is_empty());
    }

    #[test]
    fn missing_license_is_low_severity() {
        let findings = assess_vulnerabilities(&record(), &[], fixed_now());
        assert_eq!(titles(&findings), vec!["Missing License"]);
        assert_eq!(findings[0].severity, Severity::Low);
    }

    #[test]
    fn rules_fire_independently_and_deterministically() {
        let mut record = record();
        record.updated_at = fixed_now() - Duration::days(400);
        let stack = [tech("React", Some("^15.0.0"))];

        let first = assess_vulnerabilities(&record, &stack, fixed_now());
        let second = assess_vulnerabilities(&record, &stack, fixed_now());

        assert_eq!(
            titles(&first),
            vec!["Outdated Dependencies", "Infrequent Updates", "Missing License"]
        );
        assert_eq!(first, second);
    }
}
