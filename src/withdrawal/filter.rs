use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};

use super::{ActionOrigin, ParseValueError, WithdrawalRequest, WithdrawalStatus};

const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Creation-time window applied to the request list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    Last24Hours,
    Last3Days,
    Last7Days,
    Last30Days,
    #[default]
    YearToDate,
}

impl TimeRange {
    pub const ALL: [TimeRange; 5] = [
        TimeRange::Last24Hours,
        TimeRange::Last3Days,
        TimeRange::Last7Days,
        TimeRange::Last30Days,
        TimeRange::YearToDate,
    ];

    /// Inclusive age limit in days, `None` for the calendar-year window.
    pub fn max_days(&self) -> Option<u32> {
        match self {
            TimeRange::Last24Hours => Some(1),
            TimeRange::Last3Days => Some(3),
            TimeRange::Last7Days => Some(7),
            TimeRange::Last30Days => Some(30),
            TimeRange::YearToDate => None,
        }
    }

    pub fn matches(&self, timestamp: &DateTime<Utc>, now: &DateTime<Utc>) -> bool {
        match self.max_days() {
            Some(days) => {
                let age_days = (*now - *timestamp).num_milliseconds() as f64 / MS_PER_DAY;
                age_days <= f64::from(days)
            }
            None => timestamp.year() == now.year(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Last24Hours => "Last 24 Hours",
            TimeRange::Last3Days => "Last 3 Days",
            TimeRange::Last7Days => "Last 7 Days",
            TimeRange::Last30Days => "Last 30 Days",
            TimeRange::YearToDate => "Year to Date",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last24Hours => "24h",
            TimeRange::Last3Days => "3d",
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::YearToDate => "ytd",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|range| range.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseValueError::new("time range", s))
    }
}

/// Active list filters. Every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawalFilter {
    pub time_range: TimeRange,
    pub status: Option<WithdrawalStatus>,
    pub action: Option<ActionOrigin>,
    /// Case-insensitive wallet address fragment; empty matches everything.
    pub search: String,
}

impl WithdrawalFilter {
    pub fn matches(&self, request: &WithdrawalRequest, now: &DateTime<Utc>) -> bool {
        let matches_time = self.time_range.matches(&request.timestamp, now);
        let matches_status = self.status.map_or(true, |status| request.status == status);
        let matches_action = self.action.map_or(true, |action| request.action == action);
        let matches_search = self.search.is_empty()
            || request
                .wallet_address
                .to_lowercase()
                .contains(&self.search.to_lowercase());

        matches_time && matches_status && matches_action && matches_search
    }
}

/// Filters against the current wall clock.
pub fn filter_requests<'a>(
    requests: &'a [WithdrawalRequest],
    filter: &WithdrawalFilter,
) -> Vec<&'a WithdrawalRequest> {
    filter_requests_at(requests, filter, Utc::now())
}

pub fn filter_requests_at<'a>(
    requests: &'a [WithdrawalRequest],
    filter: &WithdrawalFilter,
    now: DateTime<Utc>,
) -> Vec<&'a WithdrawalRequest> {
    requests
        .iter()
        .filter(|request| filter.matches(request, &now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::request;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn ids(filtered: Vec<&WithdrawalRequest>) -> Vec<&str> {
        filtered.into_iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_day_windows_are_inclusive() {
        let now = now();
        let requests = vec![
            request("exact-1d", "WalletA", "1", now - Duration::days(1)),
            request("over-1d", "WalletB", "1", now - Duration::days(1) - Duration::seconds(1)),
            request("exact-3d", "WalletC", "1", now - Duration::days(3)),
            request("exact-30d", "WalletD", "1", now - Duration::days(30)),
            request("old", "WalletE", "1", now - Duration::days(31)),
        ];

        let mut filter = WithdrawalFilter::default();

        filter.time_range = TimeRange::Last24Hours;
        assert_eq!(ids(filter_requests_at(&requests, &filter, now)), vec!["exact-1d"]);

        filter.time_range = TimeRange::Last3Days;
        assert_eq!(
            ids(filter_requests_at(&requests, &filter, now)),
            vec!["exact-1d", "over-1d", "exact-3d"]
        );

        filter.time_range = TimeRange::Last30Days;
        assert_eq!(filter_requests_at(&requests, &filter, now).len(), 4);
    }

    #[test]
    fn test_year_to_date_ignores_month_and_day() {
        let now = now();
        let requests = vec![
            request("jan", "WalletA", "1", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            request("dec", "WalletB", "1", Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap()),
            request("last-year", "WalletC", "1", Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()),
        ];

        let filter = WithdrawalFilter::default();
        assert_eq!(ids(filter_requests_at(&requests, &filter, now)), vec!["jan", "dec"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let now = now();
        let requests = vec![
            request("a", "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin", "1", now),
            request("b", "HxyJMByx51q9GktkegmAKB66Z8Q2mQfEcAXekmfXHVz2", "1", now),
        ];

        let filter = WithdrawalFilter {
            search: "qewvg".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(filter_requests_at(&requests, &filter, now)), vec!["a"]);

        let filter = WithdrawalFilter {
            search: "XYZ-NOT-THERE".to_string(),
            ..Default::default()
        };
        assert!(filter_requests_at(&requests, &filter, now).is_empty());
    }

    #[test]
    fn test_combined_filters_intersect() {
        let now = now();
        let mut rejected = request("rejected-recent", "walletAAA", "1", now - Duration::hours(2));
        rejected.status = WithdrawalStatus::Rejected;
        let mut lose = request("lose-recent", "walletAAA", "1", now - Duration::hours(3));
        lose.action = ActionOrigin::Lose;
        let requests = vec![
            request("pending-recent", "walletAAA", "1", now - Duration::hours(1)),
            request("pending-old", "walletAAA", "1", now - Duration::days(10)),
            request("pending-other", "walletBBB", "1", now - Duration::hours(1)),
            rejected,
            lose,
        ];

        let by_time = WithdrawalFilter {
            time_range: TimeRange::Last24Hours,
            ..Default::default()
        };
        let by_status = WithdrawalFilter {
            status: Some(WithdrawalStatus::Pending),
            ..Default::default()
        };
        let by_search = WithdrawalFilter {
            search: "aaa".to_string(),
            ..Default::default()
        };
        let by_action = WithdrawalFilter {
            action: Some(ActionOrigin::Withdraw),
            ..Default::default()
        };
        let combined = WithdrawalFilter {
            time_range: TimeRange::Last24Hours,
            status: Some(WithdrawalStatus::Pending),
            action: Some(ActionOrigin::Withdraw),
            search: "aaa".to_string(),
        };

        let expected: Vec<&str> = ids(filter_requests_at(&requests, &by_time, now))
            .into_iter()
            .filter(|id| ids(filter_requests_at(&requests, &by_status, now)).contains(id))
            .filter(|id| ids(filter_requests_at(&requests, &by_search, now)).contains(id))
            .filter(|id| ids(filter_requests_at(&requests, &by_action, now)).contains(id))
            .collect();

        assert_eq!(ids(filter_requests_at(&requests, &combined, now)), expected);
        assert_eq!(expected, vec!["pending-recent"]);
    }

    #[test]
    fn test_parse_time_range() {
        assert_eq!("24H".parse::<TimeRange>(), Ok(TimeRange::Last24Hours));
        assert_eq!("ytd".parse::<TimeRange>(), Ok(TimeRange::YearToDate));
        assert!("1y".parse::<TimeRange>().is_err());
    }
}
