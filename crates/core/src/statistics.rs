//! Pure helpers for the statistics dashboards.
//!
//! The queries run in the persistence layer; this module owns the fixed
//! windows, zero-filling, percentage rounding and the reduction of the
//! concurrently computed fee figures.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::asset_kind::{type_name, AssetKind};
use crate::error::CoreError;
use crate::status::StatusId;
use crate::types::{Cents, Timestamp};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Number of years in the yearly trend, ending at the current year.
pub const TREND_YEARS: i32 = 5;

/// Number of months in the overview creation trend, ending at the current month.
pub const TREND_MONTHS: u32 = 6;

/// Maximum number of rows in the top-applicant ranking.
pub const TOP_APPLICANT_LIMIT: i64 = 10;

/* --------------------------------------------------------------------------
Yearly trends
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearlyTrend {
    pub year: i32,
    pub count: i64,
}

/// `[current_year - 4, ..., current_year]`.
pub fn trend_years(current_year: i32) -> Vec<i32> {
    (current_year - TREND_YEARS + 1..=current_year).collect()
}

/// Lay `(year, count)` rows over the five-year window; absent years are zero
/// and rows outside the window are ignored.
pub fn fill_yearly_trends(
    current_year: i32,
    rows: impl IntoIterator<Item = (i32, i64)>,
) -> Vec<YearlyTrend> {
    let counts: HashMap<i32, i64> = rows.into_iter().collect();
    trend_years(current_year)
        .into_iter()
        .map(|year| YearlyTrend {
            year,
            count: counts.get(&year).copied().unwrap_or(0),
        })
        .collect()
}

/* --------------------------------------------------------------------------
Type distribution
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeShare {
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub count: i64,
    pub percentage: f64,
}

/// `count / total * 100`, rounded to two decimals. Zero when `total` is zero.
pub fn percentage(count: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

/// Turn `(type_code, count)` rows into named shares, largest first.
///
/// Codes that no longer exist in the kind's table are merged under `"other"`.
pub fn type_distribution(
    kind: AssetKind,
    rows: impl IntoIterator<Item = (StatusId, i64)>,
) -> Vec<TypeShare> {
    let mut by_name: Vec<(&'static str, i64)> = Vec::new();
    for (code, count) in rows {
        let name = type_name(kind, code);
        match by_name.iter_mut().find(|(n, _)| *n == name) {
            Some((_, c)) => *c += count,
            None => by_name.push((name, count)),
        }
    }

    let total: i64 = by_name.iter().map(|(_, c)| c).sum();
    let mut shares: Vec<TypeShare> = by_name
        .into_iter()
        .map(|(type_name, count)| TypeShare {
            type_name,
            count,
            percentage: percentage(count, total),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.type_name.cmp(b.type_name)));
    shares
}

/* --------------------------------------------------------------------------
Monthly creation trend
-------------------------------------------------------------------------- */

/// Half-open `[start, end)` month windows, oldest first, the last one being
/// the month containing `now`.
pub fn month_windows(now: Timestamp, months: u32) -> Result<Vec<(Timestamp, Timestamp)>, CoreError> {
    let this_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .ok_or_else(|| CoreError::Internal(format!("No first day of month for {now}")))?;
    let midnight = |d: NaiveDate| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN));

    (0..months)
        .rev()
        .map(|back| {
            let start = this_month
                .checked_sub_months(Months::new(back))
                .ok_or_else(|| CoreError::Internal("Month window underflow".to_string()))?;
            let end = start
                .checked_add_months(Months::new(1))
                .ok_or_else(|| CoreError::Internal("Month window overflow".to_string()))?;
            Ok((midnight(start), midnight(end)))
        })
        .collect()
}

/* --------------------------------------------------------------------------
Fee statistics
-------------------------------------------------------------------------- */

/// One of the four independently computed fee figures, tagged by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeStatistic {
    /// Unpaid records whose deadline is today or later.
    PendingCount(i64),
    /// Sum of paid records settled during the current year.
    PaidAmount(Cents),
    /// Unpaid records whose deadline has passed.
    OverdueCount(i64),
    /// Sum of all records billed for the current fee year.
    TotalAnnualFee(Cents),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeStatistics {
    pub current_year: i32,
    pub pending_count: i64,
    pub paid_amount: Cents,
    pub overdue_count: i64,
    pub total_annual_fee: Cents,
    pub last_updated: Timestamp,
}

impl FeeStatistics {
    /// Reduce the tagged figures once all of them have completed.
    pub fn reduce(
        current_year: i32,
        last_updated: Timestamp,
        figures: impl IntoIterator<Item = FeeStatistic>,
    ) -> Self {
        let mut stats = Self {
            current_year,
            pending_count: 0,
            paid_amount: 0,
            overdue_count: 0,
            total_annual_fee: 0,
            last_updated,
        };
        for figure in figures {
            match figure {
                FeeStatistic::PendingCount(n) => stats.pending_count = n,
                FeeStatistic::PaidAmount(a) => stats.paid_amount = a,
                FeeStatistic::OverdueCount(n) => stats.overdue_count = n,
                FeeStatistic::TotalAnnualFee(a) => stats.total_annual_fee = a,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- yearly trends -------------------------------------------------------

    #[test]
    fn trend_window_is_five_ascending_years() {
        assert_eq!(trend_years(2026), vec![2022, 2023, 2024, 2025, 2026]);
    }

    #[test]
    fn trends_are_zero_filled() {
        let trends = fill_yearly_trends(2026, [(2024, 3), (2026, 1), (2019, 9)]);
        assert_eq!(trends.len(), 5);
        let counts: Vec<i64> = trends.iter().map(|t| t.count).collect();
        assert_eq!(counts, vec![0, 0, 3, 0, 1]);
        assert!(trends.windows(2).all(|w| w[0].year < w[1].year));
    }

    // -- percentage ----------------------------------------------------------

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
    }

    // -- type distribution ---------------------------------------------------

    #[test]
    fn distribution_names_types_and_merges_unknown_codes() {
        let shares = type_distribution(AssetKind::Patent, [(1, 2), (3, 1), (6, 1), (7, 0)]);
        assert_eq!(shares[0].type_name, "invention");
        assert_eq!(shares[0].percentage, 50.0);
        let other = shares.iter().find(|s| s.type_name == "other").unwrap();
        assert_eq!(other.count, 1);
        assert_eq!(shares.len(), 3);
    }

    #[test]
    fn empty_distribution() {
        assert!(type_distribution(AssetKind::Article, []).is_empty());
    }

    // -- month windows -------------------------------------------------------

    #[test]
    fn month_windows_cross_year_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 2, 14, 10, 0, 0).unwrap();
        let windows = month_windows(now, TREND_MONTHS).unwrap();
        assert_eq!(windows.len(), 6);
        assert_eq!(windows[0].0, Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap());
        assert_eq!(windows[5].0, Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(windows[5].1, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert!(windows.windows(2).all(|w| w[0].1 == w[1].0));
    }

    // -- fee statistics ------------------------------------------------------

    #[test]
    fn reduce_is_order_independent() {
        let now = Utc::now();
        let a = FeeStatistics::reduce(
            2025,
            now,
            [
                FeeStatistic::TotalAnnualFee(900),
                FeeStatistic::PendingCount(2),
                FeeStatistic::OverdueCount(1),
                FeeStatistic::PaidAmount(300),
            ],
        );
        let b = FeeStatistics::reduce(
            2025,
            now,
            [
                FeeStatistic::PaidAmount(300),
                FeeStatistic::OverdueCount(1),
                FeeStatistic::PendingCount(2),
                FeeStatistic::TotalAnnualFee(900),
            ],
        );
        assert_eq!(a, b);
        assert_eq!(a.pending_count, 2);
        assert_eq!(a.total_annual_fee, 900);
    }
}
