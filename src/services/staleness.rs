//! Staleness evaluation.

use crate::services::scanner::LatestDateByPrefix;
use chrono::{Duration, NaiveDate};

/// Prefixes whose newest manifest is more than `max_age_days` whole days
/// older than `today`.
///
/// A backup exactly `max_age_days` old is still fresh. Prefixes missing from
/// `latest` never appear in the result.
pub fn stale_dates_by_prefix(
    latest: &LatestDateByPrefix,
    today: NaiveDate,
    max_age_days: u32,
) -> LatestDateByPrefix {
    let max_age = Duration::days(i64::from(max_age_days));
    latest
        .iter()
        .filter(|(_, date)| today - **date > max_age)
        .map(|(prefix, date)| (prefix.clone(), *date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_only_old_prefixes_are_stale() {
        let latest = LatestDateByPrefix::from([
            ("a".to_string(), date(2024, 2, 15)),
            ("b".to_string(), date(2024, 1, 15)),
        ]);
        let stale = stale_dates_by_prefix(&latest, date(2024, 3, 1), 30);
        assert_eq!(stale, LatestDateByPrefix::from([("b".to_string(), date(2024, 1, 15))]));
    }

    #[test]
    fn test_boundary_is_strict() {
        let today = date(2024, 3, 1);
        let exactly = LatestDateByPrefix::from([("a".to_string(), today - Duration::days(7))]);
        assert!(stale_dates_by_prefix(&exactly, today, 7).is_empty());

        let one_more = LatestDateByPrefix::from([("a".to_string(), today - Duration::days(8))]);
        assert_eq!(stale_dates_by_prefix(&one_more, today, 7).len(), 1);
    }

    #[test]
    fn test_future_and_empty_inputs() {
        let today = date(2024, 3, 1);
        let future = LatestDateByPrefix::from([("a".to_string(), date(2024, 4, 1))]);
        assert!(stale_dates_by_prefix(&future, today, 1).is_empty());
        assert!(stale_dates_by_prefix(&LatestDateByPrefix::new(), today, 1).is_empty());
    }
}
