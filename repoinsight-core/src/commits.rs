//! Daily commit series for the last 30 days.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone};

use crate::domain::{CommitDay, CommitSummary};

/// Number of days in the commit series.
pub const COMMIT_WINDOW_DAYS: i64 = 30;

/// Count commits per calendar day for the 30 days ending on `now`'s date.
///
/// Commit timestamps are converted into `now`'s time zone and compared by
/// calendar date, so a commit lands on exactly one day. The series is
/// ordered oldest to newest and always has [`COMMIT_WINDOW_DAYS`] entries.
pub fn bin_commits<Tz: TimeZone>(commits: &[CommitSummary], now: &DateTime<Tz>) -> Vec<CommitDay> {
    let zone = now.timezone();
    let mut per_day: HashMap<NaiveDate, u32> = HashMap::new();
    for commit in commits {
        let day = commit.authored_at.with_timezone(&zone).date_naive();
        *per_day.entry(day).or_insert(0) += 1;
    }

    let today = now.date_naive();
    (0..COMMIT_WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            CommitDay {
                date: day.format("%Y-%m-%d").to_string(),
                count: per_day.get(&day).copied().unwrap_or(0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn commit(at: DateTime<Utc>) -> CommitSummary {
        CommitSummary {
            sha: format!("{:x}", at.timestamp()),
            authored_at: at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn empty_history_yields_thirty_zero_days() {
        let days = bin_commits(&[], &now());

        assert_eq!(days.len(), 30);
        assert!(days.iter().all(|day| day.count == 0));
        assert_eq!(days.first().unwrap().date, "2026-02-14");
        assert_eq!(days.last().unwrap().date, "2026-03-15");
    }

    #[test]
    fn dates_are_consecutive_oldest_first() {
        let days = bin_commits(&[], &now());
        let parsed: Vec<NaiveDate> = days
            .iter()
            .map(|day| NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").unwrap())
            .collect();
        for pair in parsed.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }

    #[test]
    fn counts_commits_by_calendar_day() {
        let commits = vec![
            commit(Utc.with_ymd_and_hms(2026, 3, 15, 0, 5, 0).unwrap()),
            commit(Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap()),
            commit(Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 59).unwrap()),
            commit(Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap()),
            commit(Utc.with_ymd_and_hms(2026, 2, 13, 23, 0, 0).unwrap()),
        ];
        let days = bin_commits(&commits, &now());

        assert_eq!(days[29].count, 2);
        assert_eq!(days[28].count, 1);
        assert_eq!(days[0].count, 1);
        assert_eq!(days.iter().map(|day| day.count).sum::<u32>(), 4);
    }

    #[test]
    fn uses_the_callers_time_zone_for_day_boundaries() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_now = now().with_timezone(&offset);
        // 23:30 UTC on the 14th is 01:30 on the 15th at UTC+2.
        let commits = vec![commit(Utc.with_ymd_and_hms(2026, 3, 14, 23, 30, 0).unwrap())];

        let days = bin_commits(&commits, &local_now);

        assert_eq!(days[29].date, "2026-03-15");
        assert_eq!(days[29].count, 1);
        assert_eq!(days[28].count, 0);
    }
}
