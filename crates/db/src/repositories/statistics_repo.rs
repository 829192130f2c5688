//! Read-only aggregate queries behind the statistics dashboards.
//!
//! Every method takes an optional kind filter and issues exactly one query,
//! so callers can run several of them concurrently on the pool.

use chrono::NaiveDate;
use ipledger_core::approval::ApprovalStatus;
use ipledger_core::fees::PaymentStatus;
use ipledger_core::status::StatusId;
use ipledger_core::types::{Cents, Timestamp};
use sqlx::PgPool;

use crate::models::statistics::{TopApplicant, TypeCount, YearCount};

/// Provides aggregate reads over assets and fees.
pub struct StatisticsRepo;

impl StatisticsRepo {
    // -- fee figures --------------------------------------------------------

    /// Unpaid fees whose deadline is `today` or later.
    pub async fn pending_fee_count(
        pool: &PgPool,
        kind_id: Option<StatusId>,
        today: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM fees f JOIN assets a ON a.id = f.asset_id \
             WHERE ($1::SMALLINT IS NULL OR a.kind_id = $1) \
               AND f.payment_status_id = $2 AND f.deadline_date >= $3",
        )
        .bind(kind_id)
        .bind(PaymentStatus::Unpaid.id())
        .bind(today)
        .fetch_one(pool)
        .await
    }

    /// Unpaid fees whose deadline is before `today`.
    pub async fn overdue_fee_count(
        pool: &PgPool,
        kind_id: Option<StatusId>,
        today: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM fees f JOIN assets a ON a.id = f.asset_id \
             WHERE ($1::SMALLINT IS NULL OR a.kind_id = $1) \
               AND f.payment_status_id = $2 AND f.deadline_date < $3",
        )
        .bind(kind_id)
        .bind(PaymentStatus::Unpaid.id())
        .bind(today)
        .fetch_one(pool)
        .await
    }

    /// Sum of paid fees settled during `year`.
    pub async fn paid_amount_in_year(
        pool: &PgPool,
        kind_id: Option<StatusId>,
        year: i32,
    ) -> Result<Cents, sqlx::Error> {
        sqlx::query_scalar::<_, Cents>(
            "SELECT COALESCE(SUM(f.amount_cents), 0)::BIGINT \
             FROM fees f JOIN assets a ON a.id = f.asset_id \
             WHERE ($1::SMALLINT IS NULL OR a.kind_id = $1) \
               AND f.payment_status_id = $2 \
               AND EXTRACT(YEAR FROM f.actual_pay_date)::INTEGER = $3",
        )
        .bind(kind_id)
        .bind(PaymentStatus::Paid.id())
        .bind(year)
        .fetch_one(pool)
        .await
    }

    /// Sum of every fee billed for `fee_year`.
    pub async fn total_fee_for_year(
        pool: &PgPool,
        kind_id: Option<StatusId>,
        fee_year: i32,
    ) -> Result<Cents, sqlx::Error> {
        sqlx::query_scalar::<_, Cents>(
            "SELECT COALESCE(SUM(f.amount_cents), 0)::BIGINT \
             FROM fees f JOIN assets a ON a.id = f.asset_id \
             WHERE ($1::SMALLINT IS NULL OR a.kind_id = $1) AND f.fee_year = $2",
        )
        .bind(kind_id)
        .bind(fee_year)
        .fetch_one(pool)
        .await
    }

    // -- asset figures ------------------------------------------------------

    /// Assets per application year within `[first_year, last_year]`.
    /// Years without assets are absent.
    pub async fn yearly_counts(
        pool: &PgPool,
        kind_id: Option<StatusId>,
        first_year: i32,
        last_year: i32,
    ) -> Result<Vec<YearCount>, sqlx::Error> {
        sqlx::query_as::<_, YearCount>(
            "SELECT EXTRACT(YEAR FROM apply_date)::INTEGER AS year, COUNT(*)::BIGINT AS count \
             FROM assets \
             WHERE ($1::SMALLINT IS NULL OR kind_id = $1) \
               AND EXTRACT(YEAR FROM apply_date)::INTEGER BETWEEN $2 AND $3 \
             GROUP BY 1 \
             ORDER BY 1",
        )
        .bind(kind_id)
        .bind(first_year)
        .bind(last_year)
        .fetch_all(pool)
        .await
    }

    /// Assets of one kind per sub-type code.
    pub async fn type_counts(
        pool: &PgPool,
        kind_id: StatusId,
    ) -> Result<Vec<TypeCount>, sqlx::Error> {
        sqlx::query_as::<_, TypeCount>(
            "SELECT type_code, COUNT(*)::BIGINT AS count \
             FROM assets WHERE kind_id = $1 \
             GROUP BY type_code \
             ORDER BY type_code",
        )
        .bind(kind_id)
        .fetch_all(pool)
        .await
    }

    /// First authors ranked by number of assets, blank names excluded.
    pub async fn top_applicants(
        pool: &PgPool,
        kind_id: Option<StatusId>,
        limit: i64,
    ) -> Result<Vec<TopApplicant>, sqlx::Error> {
        sqlx::query_as::<_, TopApplicant>(
            "SELECT u.user_name AS applicant, COUNT(*)::BIGINT AS count \
             FROM assets a JOIN users u ON u.id = a.first_author_id \
             WHERE ($1::SMALLINT IS NULL OR a.kind_id = $1) \
               AND btrim(u.user_name) <> '' \
             GROUP BY u.user_name \
             ORDER BY count DESC, u.user_name \
             LIMIT $2",
        )
        .bind(kind_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Titles of every asset of the kind, for keyword classification.
    pub async fn titles(
        pool: &PgPool,
        kind_id: Option<StatusId>,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT title FROM assets \
             WHERE ($1::SMALLINT IS NULL OR kind_id = $1) \
             ORDER BY id",
        )
        .bind(kind_id)
        .fetch_all(pool)
        .await
    }

    /// Number of assets of the kind (all kinds when `None`).
    pub async fn asset_count(
        pool: &PgPool,
        kind_id: Option<StatusId>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM assets WHERE ($1::SMALLINT IS NULL OR kind_id = $1)",
        )
        .bind(kind_id)
        .fetch_one(pool)
        .await
    }

    /// Assets of any kind still under review.
    pub async fn pending_approval_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM assets WHERE approval_status_id = $1",
        )
        .bind(ApprovalStatus::InProgress.id())
        .fetch_one(pool)
        .await
    }

    /// Assets of the kind created within `[start, end)`.
    pub async fn created_between(
        pool: &PgPool,
        kind_id: Option<StatusId>,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM assets \
             WHERE ($1::SMALLINT IS NULL OR kind_id = $1) \
               AND created_at >= $2 AND created_at < $3",
        )
        .bind(kind_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
    }
}
