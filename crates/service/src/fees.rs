//! Fee ledger operations: listings, amount corrections, monthly summaries
//! and annual renewals.

use chrono::Utc;
use ipledger_core::approval::ApprovalStatus;
use ipledger_core::asset_kind::{AssetKind, AssetType};
use ipledger_core::error::CoreError;
use ipledger_core::fees::{
    fee_deadline, parse_amount_update, MonthlyFeeStats, PaymentStatus, StatsWindow,
};
use ipledger_core::search::{like_pattern, PageWindow};
use ipledger_core::types::DbId;
use ipledger_db::models::asset::AssetKey;
use ipledger_db::models::fee::{AmountUpdate, CreateFee, Fee, FeeFilter, FeeListing};
use ipledger_db::repositories::FeeRepo;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::assets::find_asset;
use crate::context::LedgerContext;
use crate::error::ServiceResult;
use crate::response::Page;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeeQuery {
    pub kind: Option<AssetKind>,
    /// Case-insensitive substring of the asset's title or application number.
    pub keyword: Option<String>,
    pub status: Option<PaymentStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List fees, latest deadline first.
pub async fn list_fees(ctx: &LedgerContext, query: &FeeQuery) -> ServiceResult<Page<FeeListing>> {
    let window = PageWindow::new(query.page, query.page_size);
    let filter = FeeFilter {
        kind_id: query.kind.map(AssetKind::id),
        payment_status_id: query.status.map(PaymentStatus::id),
        keyword_pattern: like_pattern(query.keyword.as_deref()),
    };
    let (items, total) = tokio::try_join!(
        FeeRepo::list(&ctx.pool, &filter, window.limit, window.offset),
        FeeRepo::count(&ctx.pool, &filter),
    )?;
    Ok(Page::new(items, total, window))
}

/// Correct the amount of one fee.
///
/// `fields` may contain only `amount`. The key (plus `fee_year`, for assets
/// with renewals) must resolve to exactly one fee.
pub async fn update_amount(
    ctx: &LedgerContext,
    key: &AssetKey,
    fee_year: Option<i32>,
    fields: &Map<String, Value>,
) -> ServiceResult<Fee> {
    let amount = parse_amount_update(fields)?;

    match FeeRepo::update_amount(&ctx.pool, key, fee_year, amount).await? {
        AmountUpdate::Updated(fee) => {
            tracing::info!(
                fee_id = fee.id,
                asset_id = fee.asset_id,
                fee_year = fee.fee_year,
                amount_cents = amount,
                "Fee amount corrected"
            );
            Ok(fee)
        }
        AmountUpdate::Unmatched { matches } => {
            let key = match (fee_year, matches) {
                (Some(year), _) => format!("{key} (fee year {year})"),
                (None, 0) => key.to_string(),
                (None, n) => format!("{key} ({n} fees match; a fee year is required)"),
            };
            Err(CoreError::NotFoundByKey { entity: "Fee", key }.into())
        }
    }
}

/// Fees of one kind bucketed by payment status.
pub async fn monthly_stats(
    ctx: &LedgerContext,
    kind: AssetKind,
    window: StatsWindow,
) -> ServiceResult<MonthlyFeeStats> {
    let groups = FeeRepo::payment_status_groups(&ctx.pool, kind.id(), window.bounds()?).await?;
    let rows = groups
        .into_iter()
        .map(|g| Ok((PaymentStatus::from_id(g.payment_status_id)?, g.count, g.amount)))
        .collect::<Result<Vec<_>, CoreError>>()?;
    Ok(MonthlyFeeStats::from_groups(rows))
}

/// Bill the annual renewal for `fee_year`, priced from the asset's sub-type.
///
/// Rejected assets are not renewed. A second renewal for the same year fails
/// with `Conflict`.
pub async fn append_renewal(
    ctx: &LedgerContext,
    asset_id: DbId,
    fee_year: i32,
) -> ServiceResult<Fee> {
    let asset = find_asset(ctx, &AssetKey::Id(asset_id)).await?;
    if asset.status()? == ApprovalStatus::Rejected {
        return Err(CoreError::InvalidState(format!(
            "Asset {asset_id} was rejected and cannot be renewed"
        ))
        .into());
    }
    if !(1900..=9999).contains(&fee_year) {
        return Err(CoreError::Validation(format!("Fee year {fee_year} out of range")).into());
    }

    let asset_type = AssetType::new(asset.kind()?, asset.type_code)?;
    let now = Utc::now();
    let input = CreateFee {
        fee_year,
        amount_cents: asset_type.review_fee(),
        deadline_date: fee_deadline(now)?,
        created_at: now,
    };

    let fee = FeeRepo::append(&ctx.pool, asset_id, &input).await?;
    tracing::info!(
        fee_id = fee.id,
        asset_id,
        fee_year,
        amount_cents = fee.amount_cents,
        deadline = %fee.deadline_date,
        "Renewal fee appended"
    );
    Ok(fee)
}

/// Every fee billed to one asset, oldest fee year first.
pub async fn fees_for_asset(ctx: &LedgerContext, asset_id: DbId) -> ServiceResult<Vec<Fee>> {
    let asset = find_asset(ctx, &AssetKey::Id(asset_id)).await?;
    Ok(FeeRepo::list_for_asset(&ctx.pool, asset.id).await?)
}
