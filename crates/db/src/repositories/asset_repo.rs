//! Repository for the `assets` table and its registration transaction.

use ipledger_core::approval::{ApprovalStatus, ApprovalStep};
use ipledger_core::types::DbId;
use sqlx::PgPool;

use crate::models::asset::{Asset, AssetFilter, CreateAsset, Registration, ReviewUpdate};
use crate::models::author::AssetAuthor;
use crate::models::fee::{CreateFee, Fee};
use crate::repositories::author_repo::AUTHOR_COLUMNS;
use crate::repositories::fee_repo::FEE_COLUMNS;

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "\
    id, kind_id, type_code, title, abstract_text, application_number, apply_date, \
    attachment_url, first_author_id, current_step_id, approval_status_id, \
    initial_reviewer_id, initial_comment, initial_reviewed_at, initial_approved, \
    final_reviewer_id, final_comment, final_reviewed_at, final_approved, \
    version, created_at, updated_at";

/// Shared WHERE clause for [`AssetRepo::list`] and [`AssetRepo::count`].
const FILTER: &str = "\
    WHERE ($1::SMALLINT IS NULL OR kind_id = $1) \
      AND ($2::SMALLINT IS NULL OR approval_status_id = $2) \
      AND ($3::SMALLINT IS NULL OR current_step_id = $3) \
      AND ($4::BIGINT IS NULL OR first_author_id = $4) \
      AND ($5::TEXT IS NULL OR title ILIKE $5 OR application_number ILIKE $5)";

// ---------------------------------------------------------------------------
// AssetRepo
// ---------------------------------------------------------------------------

/// Provides persistence for assets.
pub struct AssetRepo;

impl AssetRepo {
    /// Register an asset in one transaction: the asset row, its first fee,
    /// and a fresh author set (stale links for the id are removed first).
    ///
    /// `author_ids` must contain `input.first_author_id`. Any failure rolls
    /// back every row.
    pub async fn register(
        pool: &PgPool,
        input: &CreateAsset,
        fee: &CreateFee,
        author_ids: &[DbId],
    ) -> Result<Registration, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO assets \
                (kind_id, type_code, title, abstract_text, application_number, apply_date, \
                 attachment_url, first_author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {COLUMNS}"
        );
        let asset = sqlx::query_as::<_, Asset>(&query)
            .bind(input.kind_id)
            .bind(input.type_code)
            .bind(&input.title)
            .bind(&input.abstract_text)
            .bind(&input.application_number)
            .bind(input.apply_date)
            .bind(&input.attachment_url)
            .bind(input.first_author_id)
            .bind(input.created_at)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO fees (asset_id, fee_year, amount_cents, deadline_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING {FEE_COLUMNS}"
        );
        let fee = sqlx::query_as::<_, Fee>(&query)
            .bind(asset.id)
            .bind(fee.fee_year)
            .bind(fee.amount_cents)
            .bind(fee.deadline_date)
            .bind(fee.created_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM asset_authors WHERE asset_id = $1")
            .bind(asset.id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO asset_authors (asset_id, user_id, is_first_author) \
             SELECT $1, u.user_id, u.user_id = $3 \
             FROM UNNEST($2::BIGINT[]) AS u(user_id) \
             RETURNING {AUTHOR_COLUMNS}"
        );
        let authors = sqlx::query_as::<_, AssetAuthor>(&query)
            .bind(asset.id)
            .bind(author_ids)
            .bind(input.first_author_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(
            asset_id = asset.id,
            fee_id = fee.id,
            authors = authors.len(),
            "Asset registration committed"
        );
        Ok(Registration {
            asset,
            fee,
            authors,
        })
    }

    /// Find an asset by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an asset by its application number.
    pub async fn find_by_application_number(
        pool: &PgPool,
        application_number: &str,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE application_number = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(application_number)
            .fetch_optional(pool)
            .await
    }

    /// List assets matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &AssetFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assets {FILTER} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(filter.kind_id)
            .bind(filter.approval_status_id)
            .bind(filter.current_step_id)
            .bind(filter.first_author_id)
            .bind(&filter.keyword_pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count assets matching `filter` (for pagination metadata).
    pub async fn count(pool: &PgPool, filter: &AssetFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*)::BIGINT FROM assets {FILTER}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(filter.kind_id)
            .bind(filter.approval_status_id)
            .bind(filter.current_step_id)
            .bind(filter.first_author_id)
            .bind(&filter.keyword_pattern)
            .fetch_one(pool)
            .await
    }

    /// Apply a review transition if the row is still at `expected_version`
    /// and still awaiting `update.stage`.
    ///
    /// Returns `None` when the compare-and-swap fails (row missing, version
    /// moved on, or already concluded); nothing is written in that case.
    pub async fn apply_review(
        pool: &PgPool,
        id: DbId,
        expected_version: i32,
        update: &ReviewUpdate,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let prefix = match update.stage {
            ApprovalStep::Initial => "initial",
            ApprovalStep::Final => "final",
        };
        let query = format!(
            "UPDATE assets SET \
                current_step_id = $3, \
                approval_status_id = $4, \
                {prefix}_reviewer_id = $5, \
                {prefix}_comment = $6, \
                {prefix}_reviewed_at = $7, \
                {prefix}_approved = $8, \
                version = version + 1 \
             WHERE id = $1 AND version = $2 \
               AND approval_status_id = $9 AND current_step_id = $10 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(expected_version)
            .bind(update.next_step.id())
            .bind(update.next_status.id())
            .bind(update.reviewer_id)
            .bind(&update.comment)
            .bind(update.reviewed_at)
            .bind(update.approved)
            .bind(ApprovalStatus::InProgress.id())
            .bind(update.stage.id())
            .fetch_optional(pool)
            .await
    }

    /// Backfill the attachment path. Returns `None` if the asset is gone.
    pub async fn set_attachment_url(
        pool: &PgPool,
        id: DbId,
        attachment_url: &str,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET attachment_url = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(attachment_url)
            .fetch_optional(pool)
            .await
    }

    /// Delete an asset's author links and then the asset in one transaction.
    /// Fees cascade. Returns the deleted row, or `None` if it did not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM asset_authors WHERE asset_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let query = format!("DELETE FROM assets WHERE id = $1 RETURNING {COLUMNS}");
        let deleted = sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted)
    }
}
