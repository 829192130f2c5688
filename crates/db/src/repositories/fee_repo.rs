//! Repository for the `fees` table.

use ipledger_core::status::StatusId;
use ipledger_core::types::{Cents, DbId, Timestamp};
use sqlx::PgPool;

use crate::models::asset::AssetKey;
use crate::models::fee::{
    AmountUpdate, CreateFee, Fee, FeeFilter, FeeListing, PaymentStatusGroup,
};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list shared with the registration transaction.
pub(crate) const FEE_COLUMNS: &str = "\
    id, asset_id, fee_year, amount_cents, payment_status_id, deadline_date, \
    actual_pay_date, created_at, updated_at";

/// Fee columns joined with the owning asset's identifying fields.
const LISTING_COLUMNS: &str = "\
    f.id, f.asset_id, a.kind_id, a.application_number, a.title, f.fee_year, \
    f.amount_cents, f.payment_status_id, f.deadline_date, f.actual_pay_date, f.created_at";

/// Shared join and WHERE clause for [`FeeRepo::list`] and [`FeeRepo::count`].
const LISTING_FILTER: &str = "\
    FROM fees f JOIN assets a ON a.id = f.asset_id \
    WHERE ($1::SMALLINT IS NULL OR a.kind_id = $1) \
      AND ($2::SMALLINT IS NULL OR f.payment_status_id = $2) \
      AND ($3::TEXT IS NULL OR a.title ILIKE $3 OR a.application_number ILIKE $3)";

// ---------------------------------------------------------------------------
// FeeRepo
// ---------------------------------------------------------------------------

/// Provides persistence for the fee ledger.
pub struct FeeRepo;

impl FeeRepo {
    /// List fees matching `filter`, latest deadline first.
    pub async fn list(
        pool: &PgPool,
        filter: &FeeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeeListing>, sqlx::Error> {
        let query = format!(
            "SELECT {LISTING_COLUMNS} {LISTING_FILTER} \
             ORDER BY f.deadline_date DESC, f.id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, FeeListing>(&query)
            .bind(filter.kind_id)
            .bind(filter.payment_status_id)
            .bind(&filter.keyword_pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count fees matching `filter` (for pagination metadata).
    pub async fn count(pool: &PgPool, filter: &FeeFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*)::BIGINT {LISTING_FILTER}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(filter.kind_id)
            .bind(filter.payment_status_id)
            .bind(&filter.keyword_pattern)
            .fetch_one(pool)
            .await
    }

    /// All fees of one asset, oldest fee year first.
    pub async fn list_for_asset(pool: &PgPool, asset_id: DbId) -> Result<Vec<Fee>, sqlx::Error> {
        let query = format!(
            "SELECT {FEE_COLUMNS} FROM fees WHERE asset_id = $1 ORDER BY fee_year, id"
        );
        sqlx::query_as::<_, Fee>(&query)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }

    /// Append a fee (e.g. an annual renewal) to an existing asset.
    pub async fn append(
        pool: &PgPool,
        asset_id: DbId,
        input: &CreateFee,
    ) -> Result<Fee, sqlx::Error> {
        let query = format!(
            "INSERT INTO fees (asset_id, fee_year, amount_cents, deadline_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING {FEE_COLUMNS}"
        );
        sqlx::query_as::<_, Fee>(&query)
            .bind(asset_id)
            .bind(input.fee_year)
            .bind(input.amount_cents)
            .bind(input.deadline_date)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// Correct the amount of the single fee identified by `key` (and
    /// `fee_year`, when given).
    ///
    /// The matching rows are locked first; the update is applied only when
    /// exactly one fee matches.
    pub async fn update_amount(
        pool: &PgPool,
        key: &AssetKey,
        fee_year: Option<i32>,
        amount_cents: Cents,
    ) -> Result<AmountUpdate, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let ids: Vec<DbId> = sqlx::query_scalar(
            "SELECT f.id FROM fees f JOIN assets a ON a.id = f.asset_id \
             WHERE ($1::BIGINT IS NULL OR a.id = $1) \
               AND ($2::TEXT IS NULL OR a.application_number = $2) \
               AND ($3::INTEGER IS NULL OR f.fee_year = $3) \
             FOR UPDATE OF f",
        )
        .bind(key.id())
        .bind(key.application_number())
        .bind(fee_year)
        .fetch_all(&mut *tx)
        .await?;

        let [id] = ids.as_slice() else {
            tx.rollback().await?;
            return Ok(AmountUpdate::Unmatched {
                matches: ids.len(),
            });
        };

        let query = format!(
            "UPDATE fees SET amount_cents = $2 WHERE id = $1 RETURNING {FEE_COLUMNS}"
        );
        let fee = sqlx::query_as::<_, Fee>(&query)
            .bind(*id)
            .bind(amount_cents)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(AmountUpdate::Updated(fee))
    }

    /// Count and sum fees of one kind per payment status, optionally limited
    /// to fees created within `[start, end)`.
    pub async fn payment_status_groups(
        pool: &PgPool,
        kind_id: StatusId,
        created_within: Option<(Timestamp, Timestamp)>,
    ) -> Result<Vec<PaymentStatusGroup>, sqlx::Error> {
        let (start, end) = created_within.unzip();
        sqlx::query_as::<_, PaymentStatusGroup>(
            "SELECT f.payment_status_id, \
                    COUNT(*)::BIGINT AS count, \
                    COALESCE(SUM(f.amount_cents), 0)::BIGINT AS amount \
             FROM fees f JOIN assets a ON a.id = f.asset_id \
             WHERE a.kind_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL OR f.created_at >= $2) \
               AND ($3::TIMESTAMPTZ IS NULL OR f.created_at < $3) \
             GROUP BY f.payment_status_id \
             ORDER BY f.payment_status_id",
        )
        .bind(kind_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }
}
