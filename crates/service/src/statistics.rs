//! Dashboard statistics.
//!
//! Independent figures are fetched concurrently over the shared pool with
//! `tokio::try_join!`: the first failing query fails the whole call and no
//! partial result is returned.

use std::future::Future;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use ipledger_core::asset_kind::AssetKind;
use ipledger_core::error::CoreError;
use ipledger_core::statistics::{
    fill_yearly_trends, month_windows, trend_years, type_distribution as shares, FeeStatistic,
    FeeStatistics, TypeShare, YearlyTrend, TOP_APPLICANT_LIMIT, TREND_MONTHS,
};
use ipledger_core::tech_domain::{classify, DomainCount};
use ipledger_db::models::statistics::TopApplicant;
use ipledger_db::repositories::StatisticsRepo;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::context::LedgerContext;
use crate::error::{ServiceError, ServiceResult};

// ---------------------------------------------------------------------------
// Fee figures
// ---------------------------------------------------------------------------

/// Pending, paid, overdue and annual-total fee figures for the current year.
pub async fn fee_statistics(
    ctx: &LedgerContext,
    kind: Option<AssetKind>,
) -> ServiceResult<FeeStatistics> {
    let pool = &ctx.pool;
    let kind_id = kind.map(AssetKind::id);
    let now = Utc::now();
    let today = now.date_naive();
    let year = now.year();

    let figures = tokio::try_join!(
        async {
            StatisticsRepo::pending_fee_count(pool, kind_id, today)
                .await
                .map(FeeStatistic::PendingCount)
        },
        async {
            StatisticsRepo::paid_amount_in_year(pool, kind_id, year)
                .await
                .map(FeeStatistic::PaidAmount)
        },
        async {
            StatisticsRepo::overdue_fee_count(pool, kind_id, today)
                .await
                .map(FeeStatistic::OverdueCount)
        },
        async {
            StatisticsRepo::total_fee_for_year(pool, kind_id, year)
                .await
                .map(FeeStatistic::TotalAnnualFee)
        },
    )?;

    let (pending, paid, overdue, total) = figures;
    Ok(FeeStatistics::reduce(
        year,
        now,
        [pending, paid, overdue, total],
    ))
}

// ---------------------------------------------------------------------------
// Asset figures
// ---------------------------------------------------------------------------

/// Asset counts per application year over the last five years.
pub async fn yearly_trends(
    ctx: &LedgerContext,
    kind: Option<AssetKind>,
) -> ServiceResult<Vec<YearlyTrend>> {
    let current = Utc::now().year();
    let years = trend_years(current);
    let (first, last) = (years[0], current);
    let rows =
        StatisticsRepo::yearly_counts(&ctx.pool, kind.map(AssetKind::id), first, last).await?;
    Ok(fill_yearly_trends(current, rows.into_iter().map(|r| (r.year, r.count))))
}

/// Share of each sub-type among the kind's assets.
pub async fn type_distribution(
    ctx: &LedgerContext,
    kind: AssetKind,
) -> ServiceResult<Vec<TypeShare>> {
    let rows = StatisticsRepo::type_counts(&ctx.pool, kind.id()).await?;
    Ok(shares(kind, rows.into_iter().map(|r| (r.type_code, r.count))))
}

/// First authors with the most assets.
pub async fn top_applicants(
    ctx: &LedgerContext,
    kind: Option<AssetKind>,
) -> ServiceResult<Vec<TopApplicant>> {
    Ok(
        StatisticsRepo::top_applicants(&ctx.pool, kind.map(AssetKind::id), TOP_APPLICANT_LIMIT)
            .await?,
    )
}

// ---------------------------------------------------------------------------
// Technical domains
// ---------------------------------------------------------------------------

/// Classify asset titles into technical domains.
///
/// The title load and the scan together are bounded by
/// `config.tech_scan_timeout`. On expiry the scan's token is cancelled and
/// the call fails with `AnalysisTimeout`.
pub async fn tech_domains(
    ctx: &LedgerContext,
    kind: Option<AssetKind>,
) -> ServiceResult<Vec<DomainCount>> {
    let titles = async {
        StatisticsRepo::titles(&ctx.pool, kind.map(AssetKind::id))
            .await
            .map_err(ServiceError::from)
    };
    classify_within(titles, CancellationToken::new(), ctx.config.tech_scan_timeout).await
}

/// Load titles with `load` and classify them, all within `limit`.
///
/// `cancel` is fired when the bound expires, which stops a scan that is
/// still running on the blocking pool.
async fn classify_within<F>(
    load: F,
    cancel: CancellationToken,
    limit: Duration,
) -> ServiceResult<Vec<DomainCount>>
where
    F: Future<Output = ServiceResult<Vec<String>>>,
{
    let scan = async {
        let titles = load.await?;
        scan_titles(titles, cancel.clone(), limit).await
    };

    match tokio::time::timeout(limit, scan).await {
        Ok(result) => result,
        Err(_) => {
            cancel.cancel();
            tracing::warn!(timeout_secs = limit.as_secs(), "Tech-domain analysis timed out");
            Err(CoreError::AnalysisTimeout {
                secs: limit.as_secs(),
            }
            .into())
        }
    }
}

/// Run the keyword scan on the blocking pool. The scan checks `cancel`
/// between titles and gives up once it fires.
async fn scan_titles(
    titles: Vec<String>,
    cancel: CancellationToken,
    limit: Duration,
) -> ServiceResult<Vec<DomainCount>> {
    let scanned = titles.len();
    let outcome = tokio::task::spawn_blocking(move || classify(&titles, &cancel))
        .await
        .map_err(|e| CoreError::Internal(format!("Tech-domain scan task failed: {e}")))?;

    match outcome {
        Some(domains) => {
            tracing::debug!(titles = scanned, domains = domains.len(), "Tech-domain scan done");
            Ok(domains)
        }
        None => Err(CoreError::AnalysisTimeout {
            secs: limit.as_secs(),
        }
        .into()),
    }
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

/// Assets of one kind created in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub patent_count: i64,
    pub trademark_count: i64,
    pub article_count: i64,
    pub pending_approval: i64,
    /// Patents created per month, oldest month first.
    pub patent_trend: Vec<MonthlyCount>,
}

/// Headline totals plus the six-month patent creation trend.
pub async fn overview(ctx: &LedgerContext) -> ServiceResult<Overview> {
    let pool = &ctx.pool;
    let windows = month_windows(Utc::now(), TREND_MONTHS)?;

    let trend = async {
        let mut points = Vec::with_capacity(windows.len());
        for (start, end) in &windows {
            let count =
                StatisticsRepo::created_between(pool, Some(AssetKind::Patent.id()), *start, *end)
                    .await?;
            points.push(MonthlyCount {
                month: start.date_naive(),
                count,
            });
        }
        Ok::<_, sqlx::Error>(points)
    };

    let (patent_count, trademark_count, article_count, pending_approval, patent_trend) = tokio::try_join!(
        StatisticsRepo::asset_count(pool, Some(AssetKind::Patent.id())),
        StatisticsRepo::asset_count(pool, Some(AssetKind::Trademark.id())),
        StatisticsRepo::asset_count(pool, Some(AssetKind::Article.id())),
        StatisticsRepo::pending_approval_count(pool),
        trend,
    )?;

    Ok(Overview {
        patent_count,
        trademark_count,
        article_count,
        pending_approval,
        patent_trend,
    })
}
